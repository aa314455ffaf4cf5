//! Roster and venue: players, courts, and the Setup -> Active transition.

use crate::models::{
    Category, Court, CourtId, Gender, NoOpReason, Phase, Player, PlayerId, RemovedPlayer,
    SessionState,
};
use chrono::{DateTime, Utc};

/// Players needed before a rotation can start.
pub const MIN_PLAYERS_TO_START: usize = 4;

/// Fields to change on a player; `None` leaves the field as it is.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize)]
pub struct PlayerEdit {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub gender: Option<Gender>,
}

fn validated_name(
    state: &SessionState,
    name: &str,
    except: Option<PlayerId>,
) -> Result<String, NoOpReason> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NoOpReason::EmptyName);
    }
    if state.live_name_taken(trimmed, except) {
        return Err(NoOpReason::DuplicatePlayerName);
    }
    Ok(trimmed.to_string())
}

/// Add a player. During an active rotation the player joins the end of Waiting.
pub fn add_player(
    state: &mut SessionState,
    name: &str,
    category: Category,
    gender: Gender,
    now: DateTime<Utc>,
) -> Result<PlayerId, NoOpReason> {
    let name = validated_name(state, name, None)?;
    let id = state.ids.next_player();
    state
        .players
        .insert(id, Player::new(id, name, category, gender, now));
    if state.phase == Phase::Active {
        state.queue.push(id);
    }
    Ok(id)
}

/// Edit a live player's profile. Matches and the advance queue refer to players by id, so
/// they pick up the change; completed records keep their snapshot.
pub fn update_player(
    state: &mut SessionState,
    player_id: PlayerId,
    edit: PlayerEdit,
) -> Result<(), NoOpReason> {
    if !state.players.contains_key(&player_id) {
        return Err(NoOpReason::PlayerNotFound(player_id));
    }
    let name = edit
        .name
        .as_deref()
        .map(|n| validated_name(state, n, Some(player_id)))
        .transpose()?;
    let p = state
        .player_mut(player_id)
        .ok_or(NoOpReason::PlayerNotFound(player_id))?;
    if let Some(name) = name {
        p.name = name;
    }
    if let Some(category) = edit.category {
        p.category = category;
    }
    if let Some(gender) = edit.gender {
        p.gender = gender;
    }
    Ok(())
}

/// Remove a player.
///
/// In Setup the player is simply dropped. In an active rotation the player is archived with
/// its counters, leaves Waiting, and any advance-queue entry holding it is cancelled (its
/// other three players go back to Waiting). A player on court cannot be removed.
pub fn remove_player(
    state: &mut SessionState,
    player_id: PlayerId,
    now: DateTime<Utc>,
) -> Result<(), NoOpReason> {
    if !state.players.contains_key(&player_id) {
        return Err(NoOpReason::PlayerNotFound(player_id));
    }
    if state.phase == Phase::Setup {
        state.players.remove(&player_id);
        return Ok(());
    }
    if state.is_playing(player_id) {
        return Err(NoOpReason::PlayerIsPlaying(player_id));
    }

    let (cancelled, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.advance_queue)
        .into_iter()
        .partition(|q| q.contains(player_id));
    state.advance_queue = kept;
    state.queue.retain(|id| *id != player_id);

    let player = state
        .players
        .remove(&player_id)
        .ok_or(NoOpReason::PlayerNotFound(player_id))?;
    log::info!("Removed {} ({}) from the rotation", player.name, player_id);
    state.removed_players.push(RemovedPlayer {
        player,
        removed_at: now,
    });

    for queued in cancelled {
        log::info!("Cancelled queued match {} (player removed)", queued.id);
        for id in queued.player_ids() {
            state.release_to_waiting(id);
        }
    }
    Ok(())
}

/// Bring a removed player back into the live pool (end of Waiting). Refused while a live
/// player holds the same name.
pub fn restore_player(state: &mut SessionState, player_id: PlayerId) -> Result<(), NoOpReason> {
    let idx = state
        .removed_players
        .iter()
        .position(|r| r.player.id == player_id)
        .ok_or(NoOpReason::PlayerNotFound(player_id))?;
    if state.live_name_taken(&state.removed_players[idx].player.name, None) {
        return Err(NoOpReason::DuplicatePlayerName);
    }
    let removed = state.removed_players.remove(idx);
    state.players.insert(player_id, removed.player);
    state.release_to_waiting(player_id);
    Ok(())
}

/// Drop a removed player for good; it no longer counts towards any total.
pub fn delete_removed_player(
    state: &mut SessionState,
    player_id: PlayerId,
) -> Result<(), NoOpReason> {
    let before = state.removed_players.len();
    state.removed_players.retain(|r| r.player.id != player_id);
    if state.removed_players.len() == before {
        return Err(NoOpReason::PlayerNotFound(player_id));
    }
    Ok(())
}

/// Add a court; unnamed courts are called `Court N`.
pub fn add_court(state: &mut SessionState, name: Option<&str>) -> CourtId {
    let id = state.ids.next_court();
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Court::default_name(state.courts.len() + 1));
    state.courts.push(Court::new(id, name));
    id
}

pub fn rename_court(state: &mut SessionState, court_id: CourtId, name: &str) -> Result<(), NoOpReason> {
    let name = name.trim();
    if name.is_empty() {
        return Err(NoOpReason::EmptyName);
    }
    let court = state
        .courts
        .iter_mut()
        .find(|c| c.id == court_id)
        .ok_or(NoOpReason::CourtNotFound(court_id))?;
    court.name = name.to_string();
    Ok(())
}

/// Delete a court. The last court and courts holding a match cannot be deleted.
pub fn delete_court(state: &mut SessionState, court_id: CourtId) -> Result<(), NoOpReason> {
    if state.court(court_id).is_none() {
        return Err(NoOpReason::CourtNotFound(court_id));
    }
    if state.courts.len() <= 1 {
        return Err(NoOpReason::LastCourt);
    }
    if state.match_on_court(court_id).is_some() {
        return Err(NoOpReason::CourtInUse(court_id));
    }
    state.courts.retain(|c| c.id != court_id);
    Ok(())
}

/// Start the rotation: Setup -> Active, every player starts out waiting.
pub fn start_rotation(state: &mut SessionState) -> Result<(), NoOpReason> {
    if state.players.len() < MIN_PLAYERS_TO_START {
        return Err(NoOpReason::NotEnoughPlayers {
            required: MIN_PLAYERS_TO_START,
        });
    }
    let mut order: Vec<&Player> = state.players.values().collect();
    order.sort_by_key(|p| (p.added_at, p.id));
    state.queue = order.into_iter().map(|p| p.id).collect();
    state.phase = Phase::Active;
    log::info!(
        "Rotation started with {} players on {} court(s)",
        state.players.len(),
        state.courts.len()
    );
    Ok(())
}

/// Back to an empty Setup state (one default court).
pub fn reset_session(state: &mut SessionState) {
    *state = SessionState::new();
}
