//! Match lifecycle: assemble, create, edit, queue in advance, promote, complete, cancel,
//! and move between courts.

use crate::logic::assembler::{assemble, AssembleOptions};
use crate::logic::courts::first_available_court;
use crate::models::{
    CompletedMatchRecord, CourtId, Match, MatchId, NoOpReason, PlayerId, PlayerSnapshot,
    QueuedMatch, SessionState, Team,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashSet;

/// Court for a new match: the requested one if it exists and is free, else the first free court.
fn target_court(state: &SessionState, requested: Option<CourtId>) -> Result<CourtId, NoOpReason> {
    match requested {
        Some(id) if state.court(id).is_none() => Err(NoOpReason::CourtNotFound(id)),
        Some(id) if state.match_on_court(id).is_some() => Err(NoOpReason::CourtOccupied(id)),
        Some(id) => Ok(id),
        None => first_available_court(&state.matches, &state.courts).ok_or(NoOpReason::NoFreeCourt),
    }
}

fn team_of_two(team: &[PlayerId], number: u8) -> Result<Team, NoOpReason> {
    team.try_into().map_err(|_| NoOpReason::WrongTeamSize {
        team: number,
        size: team.len(),
    })
}

/// Check an operator-picked pairing. Players may not be playing or reserved anywhere except
/// in `editing` (the match being edited).
fn validate_teams(
    state: &SessionState,
    team_1: &[PlayerId],
    team_2: &[PlayerId],
    editing: Option<MatchId>,
) -> Result<(Team, Team), NoOpReason> {
    let t1 = team_of_two(team_1, 1)?;
    let t2 = team_of_two(team_2, 2)?;

    let mut seen = HashSet::new();
    for id in t1.iter().chain(t2.iter()) {
        if !seen.insert(*id) {
            return Err(NoOpReason::DuplicatePlayerInMatch(*id));
        }
        if state.player(*id).is_none() {
            return Err(NoOpReason::PlayerNotFound(*id));
        }
        let playing_elsewhere = state
            .matches
            .iter()
            .any(|m| Some(m.id) != editing && m.contains(*id));
        if playing_elsewhere || state.is_reserved(*id) {
            return Err(NoOpReason::PlayerUnavailable(*id));
        }
    }
    Ok((t1, t2))
}

/// Randomized partners only make sense once everyone has played at least once.
fn everyone_has_played(state: &SessionState) -> bool {
    state.players.values().all(|p| p.games_played >= 1)
}

/// Assemble a match from the waiting players onto `court` (or the first free court).
pub fn create_auto_match<R: Rng + ?Sized>(
    state: &mut SessionState,
    court: Option<CourtId>,
    randomize_partners: bool,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<MatchId, NoOpReason> {
    let court_id = target_court(state, court)?;
    let options = AssembleOptions {
        allow_unbalanced_fallback: true,
        randomize_partners: randomize_partners && everyone_has_played(state),
    };
    let assembly = assemble(&state.waiting_players(), options, rng);
    let proposal = assembly.proposal.ok_or(NoOpReason::NoLegalMatch)?;

    let id = state.ids.next_match();
    state.take_from_waiting(&proposal.player_ids());
    state
        .matches
        .push(Match::new(id, court_id, proposal.team_1, proposal.team_2, now));
    log::info!(
        "Match {} assembled on {}{}",
        id,
        court_id,
        if proposal.unbalanced { " (unbalanced)" } else { "" }
    );
    Ok(id)
}

/// Assemble matches onto every free court until courts or legal groupings run out.
pub fn fill_courts<R: Rng + ?Sized>(
    state: &mut SessionState,
    randomize_partners: bool,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Vec<MatchId>, NoOpReason> {
    let mut created = Vec::new();
    loop {
        match create_auto_match(state, None, randomize_partners, rng, now) {
            Ok(id) => created.push(id),
            Err(e) if created.is_empty() => return Err(e),
            Err(_) => return Ok(created),
        }
    }
}

/// Whether an automatic match could be created right now.
pub fn can_create_match<R: Rng + ?Sized>(state: &SessionState, rng: &mut R) -> bool {
    if first_available_court(&state.matches, &state.courts).is_none() {
        return false;
    }
    let options = AssembleOptions {
        allow_unbalanced_fallback: true,
        randomize_partners: false,
    };
    assemble(&state.waiting_players(), options, rng)
        .proposal
        .is_some()
}

/// Put an operator-picked pairing on a court.
pub fn create_manual_match(
    state: &mut SessionState,
    team_1: &[PlayerId],
    team_2: &[PlayerId],
    court: CourtId,
    now: DateTime<Utc>,
) -> Result<MatchId, NoOpReason> {
    let (t1, t2) = validate_teams(state, team_1, team_2, None)?;
    let court_id = target_court(state, Some(court))?;
    let id = state.ids.next_match();
    state.take_from_waiting(&[t1[0], t1[1], t2[0], t2[1]]);
    state.matches.push(Match::new(id, court_id, t1, t2, now));
    Ok(id)
}

/// Change an active match's teams and optionally its court. Players dropped from the match
/// go back to Waiting.
pub fn update_match(
    state: &mut SessionState,
    match_id: MatchId,
    team_1: &[PlayerId],
    team_2: &[PlayerId],
    court: Option<CourtId>,
) -> Result<(), NoOpReason> {
    let current = state
        .match_by_id(match_id)
        .cloned()
        .ok_or(NoOpReason::MatchNotFound(match_id))?;
    let (t1, t2) = validate_teams(state, team_1, team_2, Some(match_id))?;
    let court_id = court.unwrap_or(current.court_id);
    if state.court(court_id).is_none() {
        return Err(NoOpReason::CourtNotFound(court_id));
    }
    if let Some(other) = state.match_on_court(court_id) {
        if other.id != match_id {
            return Err(NoOpReason::CourtOccupied(court_id));
        }
    }

    let m = state
        .matches
        .iter_mut()
        .find(|m| m.id == match_id)
        .ok_or(NoOpReason::MatchNotFound(match_id))?;
    m.team_1 = t1;
    m.team_2 = t2;
    m.court_id = court_id;
    let now_playing = m.player_ids();

    state.take_from_waiting(&now_playing);
    for id in current.player_ids() {
        if !now_playing.contains(&id) {
            state.release_to_waiting(id);
        }
    }
    Ok(())
}

/// Reserve an operator-picked pairing until a court frees up.
pub fn queue_match(
    state: &mut SessionState,
    team_1: &[PlayerId],
    team_2: &[PlayerId],
    now: DateTime<Utc>,
) -> Result<MatchId, NoOpReason> {
    let (t1, t2) = validate_teams(state, team_1, team_2, None)?;
    let id = state.ids.next_match();
    state.take_from_waiting(&[t1[0], t1[1], t2[0], t2[1]]);
    state.advance_queue.push(QueuedMatch {
        id,
        team_1: t1,
        team_2: t2,
        created_at: now,
    });
    Ok(id)
}

/// Move a queued match onto `court` (or the first free court).
pub fn promote_queued_match(
    state: &mut SessionState,
    queued_id: MatchId,
    court: Option<CourtId>,
    now: DateTime<Utc>,
) -> Result<(), NoOpReason> {
    let idx = state
        .advance_queue
        .iter()
        .position(|q| q.id == queued_id)
        .ok_or(NoOpReason::MatchNotFound(queued_id))?;
    let court_id = target_court(state, court)?;
    let queued = state.advance_queue.remove(idx);
    state.matches.push(queued.promote(court_id, now));
    log::info!("Queued match {} promoted to {}", queued_id, court_id);
    Ok(())
}

pub fn cancel_queued_match(state: &mut SessionState, queued_id: MatchId) -> Result<(), NoOpReason> {
    let idx = state
        .advance_queue
        .iter()
        .position(|q| q.id == queued_id)
        .ok_or(NoOpReason::MatchNotFound(queued_id))?;
    let queued = state.advance_queue.remove(idx);
    for id in queued.player_ids() {
        state.release_to_waiting(id);
    }
    Ok(())
}

fn snapshot_team(state: &SessionState, team: Team) -> Result<[PlayerSnapshot; 2], NoOpReason> {
    let snap = |id: PlayerId| {
        state
            .player(id)
            .map(|p| p.snapshot())
            .ok_or(NoOpReason::PlayerNotFound(id))
    };
    Ok([snap(team[0])?, snap(team[1])?])
}

/// Finish a match: counters go up, a frozen record is appended, players go back to Waiting.
pub fn complete_match(
    state: &mut SessionState,
    match_id: MatchId,
    shuttle_used: u32,
    now: DateTime<Utc>,
) -> Result<(), NoOpReason> {
    let idx = state
        .matches
        .iter()
        .position(|m| m.id == match_id)
        .ok_or(NoOpReason::MatchNotFound(match_id))?;
    let m = state.matches[idx].clone();
    let record = CompletedMatchRecord {
        id: m.id,
        court_id: m.court_id,
        court_name: state
            .court(m.court_id)
            .map(|c| c.name.clone())
            .unwrap_or_default(),
        team_1: snapshot_team(state, m.team_1)?,
        team_2: snapshot_team(state, m.team_2)?,
        completed_at: now,
        shuttle_used,
        voided: false,
        voided_at: None,
    };

    state.matches.remove(idx);
    for id in m.player_ids() {
        if let Some(p) = state.player_mut(id) {
            p.record_game(shuttle_used);
        }
        state.release_to_waiting(id);
    }
    state.completed_matches.append(record);
    log::info!(
        "Match {} completed on {} ({} shuttle(s))",
        match_id,
        m.court_id,
        shuttle_used
    );
    Ok(())
}

/// Abort a match: players go back to Waiting, nothing is counted.
pub fn cancel_match(state: &mut SessionState, match_id: MatchId) -> Result<(), NoOpReason> {
    let idx = state
        .matches
        .iter()
        .position(|m| m.id == match_id)
        .ok_or(NoOpReason::MatchNotFound(match_id))?;
    let m = state.matches.remove(idx);
    for id in m.player_ids() {
        state.release_to_waiting(id);
    }
    Ok(())
}

/// Move a match to another court. If that court is busy the two matches swap courts.
pub fn switch_court(
    state: &mut SessionState,
    match_id: MatchId,
    court_id: CourtId,
) -> Result<(), NoOpReason> {
    if state.court(court_id).is_none() {
        return Err(NoOpReason::CourtNotFound(court_id));
    }
    let from = state
        .match_by_id(match_id)
        .map(|m| m.court_id)
        .ok_or(NoOpReason::MatchNotFound(match_id))?;
    if from == court_id {
        return Err(NoOpReason::SameCourt);
    }
    for m in state.matches.iter_mut() {
        if m.id == match_id {
            m.court_id = court_id;
        } else if m.court_id == court_id {
            m.court_id = from;
        }
    }
    Ok(())
}
