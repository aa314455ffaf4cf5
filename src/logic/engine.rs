//! State transition engine: one closed set of operations, applied one at a time.
//!
//! [`apply`] never mutates its input. It works on a copy and hands the copy back only if the
//! whole operation succeeded, so a rejected operation leaves no partial change behind.
//! Phase rules are checked once, here, before any operation-specific logic runs.

use crate::logic::{accounting, matches, roster};
use crate::models::{Category, CourtId, Gender, MatchId, NoOpReason, Phase, PlayerId, SessionState};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;

/// Phases in which an operation is valid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PhaseScope {
    Setup,
    Active,
    Any,
}

impl PhaseScope {
    pub fn allows(self, phase: Phase) -> bool {
        matches!(
            (self, phase),
            (PhaseScope::Any, _)
                | (PhaseScope::Setup, Phase::Setup)
                | (PhaseScope::Active, Phase::Active)
        )
    }
}

/// Every state change the operator can request.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Operation {
    AddPlayer {
        name: String,
        #[serde(default)]
        category: Category,
        #[serde(default)]
        gender: Gender,
    },
    UpdatePlayer {
        player_id: PlayerId,
        edit: roster::PlayerEdit,
    },
    RemovePlayer {
        player_id: PlayerId,
    },
    RestorePlayer {
        player_id: PlayerId,
    },
    DeletePlayerPermanently {
        player_id: PlayerId,
    },
    AddCourt {
        #[serde(default)]
        name: Option<String>,
    },
    RenameCourt {
        court_id: CourtId,
        name: String,
    },
    DeleteCourt {
        court_id: CourtId,
    },
    StartRotation,
    /// Assemble a match from the waiting players.
    CreateMatch {
        #[serde(default)]
        court_id: Option<CourtId>,
        #[serde(default)]
        randomize_partners: bool,
    },
    /// Assemble matches onto every free court.
    FillCourts {
        #[serde(default)]
        randomize_partners: bool,
    },
    CreateManualMatch {
        team_1: Vec<PlayerId>,
        team_2: Vec<PlayerId>,
        court_id: CourtId,
    },
    UpdateMatch {
        match_id: MatchId,
        team_1: Vec<PlayerId>,
        team_2: Vec<PlayerId>,
        #[serde(default)]
        court_id: Option<CourtId>,
    },
    QueueMatch {
        team_1: Vec<PlayerId>,
        team_2: Vec<PlayerId>,
    },
    PromoteQueuedMatch {
        queued_match_id: MatchId,
        #[serde(default)]
        court_id: Option<CourtId>,
    },
    CancelQueuedMatch {
        queued_match_id: MatchId,
    },
    CompleteMatch {
        match_id: MatchId,
        #[serde(default)]
        shuttle_used: u32,
    },
    CancelMatch {
        match_id: MatchId,
    },
    SwitchCourt {
        match_id: MatchId,
        court_id: CourtId,
    },
    ToggleVoid {
        record_id: MatchId,
    },
    ResetGames,
    ResetSetup,
    /// Clear everything. The caller also drops the stored snapshot.
    EndRotation,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddPlayer { .. } => "add_player",
            Operation::UpdatePlayer { .. } => "update_player",
            Operation::RemovePlayer { .. } => "remove_player",
            Operation::RestorePlayer { .. } => "restore_player",
            Operation::DeletePlayerPermanently { .. } => "delete_player_permanently",
            Operation::AddCourt { .. } => "add_court",
            Operation::RenameCourt { .. } => "rename_court",
            Operation::DeleteCourt { .. } => "delete_court",
            Operation::StartRotation => "start_rotation",
            Operation::CreateMatch { .. } => "create_match",
            Operation::FillCourts { .. } => "fill_courts",
            Operation::CreateManualMatch { .. } => "create_manual_match",
            Operation::UpdateMatch { .. } => "update_match",
            Operation::QueueMatch { .. } => "queue_match",
            Operation::PromoteQueuedMatch { .. } => "promote_queued_match",
            Operation::CancelQueuedMatch { .. } => "cancel_queued_match",
            Operation::CompleteMatch { .. } => "complete_match",
            Operation::CancelMatch { .. } => "cancel_match",
            Operation::SwitchCourt { .. } => "switch_court",
            Operation::ToggleVoid { .. } => "toggle_void",
            Operation::ResetGames => "reset_games",
            Operation::ResetSetup => "reset_setup",
            Operation::EndRotation => "end_rotation",
        }
    }

    pub fn scope(&self) -> PhaseScope {
        match self {
            Operation::AddPlayer { .. }
            | Operation::UpdatePlayer { .. }
            | Operation::RemovePlayer { .. }
            | Operation::AddCourt { .. }
            | Operation::RenameCourt { .. }
            | Operation::DeleteCourt { .. }
            | Operation::ResetGames => PhaseScope::Any,
            Operation::StartRotation | Operation::ResetSetup => PhaseScope::Setup,
            Operation::RestorePlayer { .. }
            | Operation::DeletePlayerPermanently { .. }
            | Operation::CreateMatch { .. }
            | Operation::FillCourts { .. }
            | Operation::CreateManualMatch { .. }
            | Operation::UpdateMatch { .. }
            | Operation::QueueMatch { .. }
            | Operation::PromoteQueuedMatch { .. }
            | Operation::CancelQueuedMatch { .. }
            | Operation::CompleteMatch { .. }
            | Operation::CancelMatch { .. }
            | Operation::SwitchCourt { .. }
            | Operation::ToggleVoid { .. }
            | Operation::EndRotation => PhaseScope::Active,
        }
    }
}

fn dispatch<R: Rng + ?Sized>(
    state: &mut SessionState,
    op: Operation,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<(), NoOpReason> {
    match op {
        Operation::AddPlayer {
            name,
            category,
            gender,
        } => roster::add_player(state, &name, category, gender, now).map(drop),
        Operation::UpdatePlayer { player_id, edit } => roster::update_player(state, player_id, edit),
        Operation::RemovePlayer { player_id } => roster::remove_player(state, player_id, now),
        Operation::RestorePlayer { player_id } => roster::restore_player(state, player_id),
        Operation::DeletePlayerPermanently { player_id } => {
            roster::delete_removed_player(state, player_id)
        }
        Operation::AddCourt { name } => {
            roster::add_court(state, name.as_deref());
            Ok(())
        }
        Operation::RenameCourt { court_id, name } => roster::rename_court(state, court_id, &name),
        Operation::DeleteCourt { court_id } => roster::delete_court(state, court_id),
        Operation::StartRotation => roster::start_rotation(state),
        Operation::CreateMatch {
            court_id,
            randomize_partners,
        } => matches::create_auto_match(state, court_id, randomize_partners, rng, now).map(drop),
        Operation::FillCourts { randomize_partners } => {
            matches::fill_courts(state, randomize_partners, rng, now).map(drop)
        }
        Operation::CreateManualMatch {
            team_1,
            team_2,
            court_id,
        } => matches::create_manual_match(state, &team_1, &team_2, court_id, now).map(drop),
        Operation::UpdateMatch {
            match_id,
            team_1,
            team_2,
            court_id,
        } => matches::update_match(state, match_id, &team_1, &team_2, court_id),
        Operation::QueueMatch { team_1, team_2 } => {
            matches::queue_match(state, &team_1, &team_2, now).map(drop)
        }
        Operation::PromoteQueuedMatch {
            queued_match_id,
            court_id,
        } => matches::promote_queued_match(state, queued_match_id, court_id, now),
        Operation::CancelQueuedMatch { queued_match_id } => {
            matches::cancel_queued_match(state, queued_match_id)
        }
        Operation::CompleteMatch {
            match_id,
            shuttle_used,
        } => matches::complete_match(state, match_id, shuttle_used, now),
        Operation::CancelMatch { match_id } => matches::cancel_match(state, match_id),
        Operation::SwitchCourt { match_id, court_id } => {
            matches::switch_court(state, match_id, court_id)
        }
        Operation::ToggleVoid { record_id } => {
            accounting::toggle_void(state, record_id, now).map(drop)
        }
        Operation::ResetGames => {
            accounting::reset_games(state);
            Ok(())
        }
        Operation::ResetSetup | Operation::EndRotation => {
            roster::reset_session(state);
            Ok(())
        }
    }
}

/// Apply one operation to `state`, returning the new state or why nothing changed.
pub fn apply<R: Rng + ?Sized>(
    state: &SessionState,
    op: Operation,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<SessionState, NoOpReason> {
    if !op.scope().allows(state.phase) {
        return Err(NoOpReason::InvalidPhase(state.phase));
    }
    let name = op.name();
    let mut next = state.clone();
    dispatch(&mut next, op, rng, now)?;
    debug_assert!(
        next.consistency_errors().is_empty(),
        "{} broke session invariants: {:?}",
        name,
        next.consistency_errors()
    );
    Ok(next)
}

/// Like [`apply`], but a rejected operation yields the unchanged state (logged).
pub fn apply_or_keep<R: Rng + ?Sized>(
    state: &SessionState,
    op: Operation,
    rng: &mut R,
    now: DateTime<Utc>,
) -> SessionState {
    let name = op.name();
    match apply(state, op, rng, now) {
        Ok(next) => next,
        Err(reason) => {
            log::warn!("{} ignored: {}", name, reason);
            state.clone()
        }
    }
}
