//! Persisted snapshot: JSON encoding of [`SessionState`] and the normalization applied on load.
//!
//! Loading accepts older snapshot shapes: numeric or prefixed ids, a bare court count instead
//! of a court list, full player objects in the waiting queue, and players without gender or
//! shuttle share. Whatever comes in, the loaded state satisfies the membership invariant and
//! its id counters start after the largest id already in use.

use crate::models::{
    CompletedLedger, Court, CourtId, IdGenerator, Match, Phase, Player, PlayerId, QueuedMatch,
    RemovedPlayer, SessionState,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Json(e) => write!(f, "invalid snapshot: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Json(e)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCourts {
    List(Vec<Court>),
    /// Older snapshots stored only how many courts there were.
    Count(usize),
}

impl Default for StoredCourts {
    fn default() -> Self {
        StoredCourts::List(Vec::new())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueueEntry {
    Id(PlayerId),
    Player(Player),
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredSession {
    phase: Phase,
    courts: StoredCourts,
    players: Vec<Player>,
    queue: Vec<QueueEntry>,
    matches: Vec<Match>,
    advance_queue: Vec<QueuedMatch>,
    removed_players: Vec<RemovedPlayer>,
    completed_matches: CompletedLedger,
}

pub fn to_json(state: &SessionState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(state)?)
}

pub fn from_json(json: &str) -> Result<SessionState, SnapshotError> {
    let stored: StoredSession = serde_json::from_str(json)?;
    Ok(normalize(stored))
}

/// Mark four players as placed if all are live, distinct, and not placed already.
fn claim_players(state: &SessionState, taken: &mut HashSet<PlayerId>, ids: [PlayerId; 4]) -> bool {
    let distinct: HashSet<PlayerId> = ids.iter().copied().collect();
    let ok = distinct.len() == 4
        && ids
            .iter()
            .all(|id| state.players.contains_key(id) && !taken.contains(id));
    if ok {
        taken.extend(ids);
    }
    ok
}

fn normalize(stored: StoredSession) -> SessionState {
    let mut courts = match stored.courts {
        StoredCourts::List(list) => list,
        StoredCourts::Count(n) => (1..=n)
            .map(|i| Court::new(CourtId::new(i as u64), Court::default_name(i)))
            .collect(),
    };
    let mut seen_courts = HashSet::new();
    courts.retain(|c| seen_courts.insert(c.id));

    let mut players: BTreeMap<PlayerId, Player> = BTreeMap::new();
    for p in stored.players {
        players.entry(p.id).or_insert(p);
    }
    let mut queue = Vec::with_capacity(stored.queue.len());
    for entry in stored.queue {
        let id = match entry {
            QueueEntry::Id(id) => id,
            QueueEntry::Player(p) => {
                let id = p.id;
                players.entry(id).or_insert(p);
                id
            }
        };
        queue.push(id);
    }

    if courts.is_empty() {
        let id = stored
            .matches
            .iter()
            .map(|m| m.court_id.number())
            .max()
            .unwrap_or(0)
            + 1;
        courts.push(Court::new(CourtId::new(id), Court::default_name(1)));
    }

    let mut state = SessionState {
        phase: stored.phase,
        courts,
        players,
        queue: Vec::new(),
        matches: Vec::new(),
        advance_queue: Vec::new(),
        removed_players: Vec::new(),
        completed_matches: stored.completed_matches,
        ids: IdGenerator::default(),
    };

    let mut taken: HashSet<PlayerId> = HashSet::new();
    let mut released: Vec<PlayerId> = Vec::new();

    if state.phase == Phase::Active {
        let mut courts_used = HashSet::new();
        for m in stored.matches {
            let court_free = state.court(m.court_id).is_some() && !courts_used.contains(&m.court_id);
            if court_free && claim_players(&state, &mut taken, m.player_ids()) {
                courts_used.insert(m.court_id);
                state.matches.push(m);
            } else {
                log::warn!("Dropping match {} from snapshot (conflicting court or players)", m.id);
                released.extend(m.player_ids());
            }
        }
        for q in stored.advance_queue {
            if claim_players(&state, &mut taken, q.player_ids()) {
                state.advance_queue.push(q);
            } else {
                log::warn!("Dropping queued match {} from snapshot (conflicting players)", q.id);
                released.extend(q.player_ids());
            }
        }

        let mut order: Vec<&Player> = state.players.values().collect();
        order.sort_by_key(|p| (p.added_at, p.id));
        let stragglers: Vec<PlayerId> = order.into_iter().map(|p| p.id).collect();
        for id in queue.into_iter().chain(released).chain(stragglers) {
            if state.players.contains_key(&id) && !taken.contains(&id) {
                taken.insert(id);
                state.queue.push(id);
            }
        }
    }

    state.removed_players = stored
        .removed_players
        .into_iter()
        .filter(|r| !state.players.contains_key(&r.player.id))
        .collect();

    let ledger_players: Vec<PlayerId> = state
        .completed_matches
        .records()
        .iter()
        .flat_map(|r| r.player_ids())
        .collect();
    state.ids = IdGenerator::reseed(
        state
            .players
            .keys()
            .copied()
            .chain(state.removed_players.iter().map(|r| r.player.id))
            .chain(ledger_players),
        state.courts.iter().map(|c| c.id),
        state
            .matches
            .iter()
            .map(|m| m.id)
            .chain(state.advance_queue.iter().map(|q| q.id))
            .chain(state.completed_matches.records().iter().map(|r| r.id)),
    );
    state
}
