//! Ledger corrections: voiding/restoring completed games and resetting the counters.

use crate::models::{MatchId, NoOpReason, Phase, SessionState};
use chrono::{DateTime, Utc};

/// Void a completed game, or restore a voided one.
///
/// Takes back (or gives back) exactly one game and that game's shuttle share from each of
/// the record's four players, wherever they are now: waiting, on court, reserved, or removed.
/// Permanently deleted players are skipped. Taking back floors at zero, which is the only
/// case where void followed by restore does not return the original counters.
pub fn toggle_void(
    state: &mut SessionState,
    record_id: MatchId,
    now: DateTime<Utc>,
) -> Result<bool, NoOpReason> {
    let toggle = state
        .completed_matches
        .toggle_void(record_id, now)
        .ok_or(NoOpReason::MatchNotFound(record_id))?;
    for id in toggle.players {
        let Some(p) = state.any_player_mut(id) else {
            log::debug!("{} no longer exists; skipping void correction", id);
            continue;
        };
        if toggle.voided {
            p.revert_game(toggle.shuttle_used);
        } else {
            p.record_game(toggle.shuttle_used);
        }
    }
    log::info!(
        "Match {} {}",
        record_id,
        if toggle.voided { "voided" } else { "restored" }
    );
    Ok(toggle.voided)
}

/// Zero every counter, clear the ledger, and bring every removed player back. A removed
/// player whose name is now taken by a live player stays removed, with its counters zeroed.
pub fn reset_games(state: &mut SessionState) {
    for p in state.players.values_mut() {
        p.reset_counters();
    }
    for mut removed in std::mem::take(&mut state.removed_players) {
        removed.player.reset_counters();
        if state.live_name_taken(&removed.player.name, None) {
            log::warn!(
                "{} ({}) stays removed: the name is in use",
                removed.player.name,
                removed.player.id
            );
            state.removed_players.push(removed);
            continue;
        }
        let player = removed.player;
        let id = player.id;
        state.players.insert(id, player);
        if state.phase == Phase::Active {
            state.release_to_waiting(id);
        }
    }
    state.completed_matches.clear();
    log::info!("Games reset for {} players", state.players.len());
}
