//! SessionState (the aggregate), Phase, and the reasons an operation can be rejected.

use crate::models::court::Court;
use crate::models::game::{Match, QueuedMatch};
use crate::models::ids::{CourtId, IdGenerator, MatchId, PlayerId};
use crate::models::ledger::CompletedLedger;
use crate::models::player::{Player, RemovedPlayer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

/// Why an operation left the state unchanged.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NoOpReason {
    /// The operation is not valid in the current phase.
    InvalidPhase(Phase),
    /// Not enough players to start the rotation.
    NotEnoughPlayers { required: usize },
    PlayerNotFound(PlayerId),
    CourtNotFound(CourtId),
    MatchNotFound(MatchId),
    /// Player name is empty after trimming.
    EmptyName,
    /// A live player already has this name (case-insensitive).
    DuplicatePlayerName,
    /// A team must have exactly two players.
    WrongTeamSize { team: u8, size: usize },
    /// The same player was picked twice for one match.
    DuplicatePlayerInMatch(PlayerId),
    /// Player is playing or reserved in another match.
    PlayerUnavailable(PlayerId),
    /// Player is on court; finish or cancel the match first.
    PlayerIsPlaying(PlayerId),
    /// Court already holds a different match.
    CourtOccupied(CourtId),
    /// Court holds an active match and cannot be deleted.
    CourtInUse(CourtId),
    NoFreeCourt,
    /// The waiting players cannot form a legal match.
    NoLegalMatch,
    /// At least one court must always exist.
    LastCourt,
    /// Match is already on that court.
    SameCourt,
}

impl std::fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoOpReason::InvalidPhase(phase) => write!(f, "Not allowed during {} phase", phase),
            NoOpReason::NotEnoughPlayers { required } => {
                write!(f, "Need at least {} players to start", required)
            }
            NoOpReason::PlayerNotFound(id) => write!(f, "Player {} not found", id),
            NoOpReason::CourtNotFound(id) => write!(f, "Court {} not found", id),
            NoOpReason::MatchNotFound(id) => write!(f, "Match {} not found", id),
            NoOpReason::EmptyName => write!(f, "Name must not be empty"),
            NoOpReason::DuplicatePlayerName => write!(f, "A player with this name already exists"),
            NoOpReason::WrongTeamSize { team, size } => {
                write!(f, "Team {} must have exactly 2 players (got {})", team, size)
            }
            NoOpReason::DuplicatePlayerInMatch(id) => {
                write!(f, "Player {} was selected more than once", id)
            }
            NoOpReason::PlayerUnavailable(id) => {
                write!(f, "Player {} is already playing or queued", id)
            }
            NoOpReason::PlayerIsPlaying(id) => write!(f, "Player {} is currently playing", id),
            NoOpReason::CourtOccupied(id) => write!(f, "Court {} is occupied", id),
            NoOpReason::CourtInUse(id) => write!(f, "Court {} has an active match", id),
            NoOpReason::NoFreeCourt => write!(f, "No free court"),
            NoOpReason::NoLegalMatch => write!(f, "No legal match among waiting players"),
            NoOpReason::LastCourt => write!(f, "At least one court is required"),
            NoOpReason::SameCourt => write!(f, "Match is already on that court"),
        }
    }
}

impl std::error::Error for NoOpReason {}

/// Session phase. One-way: Setup -> Active (reset/end go back to a fresh Setup state).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Adding players and courts; no rotation yet.
    #[default]
    Setup,
    /// Rotation running: matches, advance queue, ledger.
    Active,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Active => write!(f, "active"),
        }
    }
}

fn serialize_players<S: Serializer>(
    players: &BTreeMap<PlayerId, Player>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(players.values())
}

/// The whole system snapshot.
///
/// Players live in an id-indexed map; matches and the advance queue refer to them by id.
/// Every live player is in exactly one of Waiting (`queue`), Playing (`matches`) or
/// Reserved (`advance_queue`) once the rotation is active.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: Phase,
    pub courts: Vec<Court>,
    #[serde(serialize_with = "serialize_players")]
    pub players: BTreeMap<PlayerId, Player>,
    /// Waiting players, in arrival order.
    pub queue: Vec<PlayerId>,
    pub matches: Vec<Match>,
    pub advance_queue: Vec<QueuedMatch>,
    pub removed_players: Vec<RemovedPlayer>,
    pub completed_matches: CompletedLedger,
    #[serde(skip)]
    pub(crate) ids: IdGenerator,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Empty Setup state with a single default court.
    pub fn new() -> Self {
        let mut ids = IdGenerator::default();
        let court = Court::new(ids.next_court(), Court::default_name(1));
        Self {
            phase: Phase::Setup,
            courts: vec![court],
            players: BTreeMap::new(),
            queue: Vec::new(),
            matches: Vec::new(),
            advance_queue: Vec::new(),
            removed_players: Vec::new(),
            completed_matches: CompletedLedger::default(),
            ids,
        }
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Live or removed player, wherever it currently lives (for ledger corrections).
    pub fn any_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        if self.players.contains_key(&id) {
            return self.players.get_mut(&id);
        }
        self.removed_players
            .iter_mut()
            .map(|r| &mut r.player)
            .find(|p| p.id == id)
    }

    pub fn court(&self, id: CourtId) -> Option<&Court> {
        self.courts.iter().find(|c| c.id == id)
    }

    pub fn match_by_id(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn match_on_court(&self, court_id: CourtId) -> Option<&Match> {
        self.matches.iter().find(|m| m.court_id == court_id)
    }

    /// Ids bound to an active match.
    pub fn playing_ids(&self) -> HashSet<PlayerId> {
        self.matches.iter().flat_map(|m| m.player_ids()).collect()
    }

    /// Ids held by an advance-queue entry.
    pub fn reserved_ids(&self) -> HashSet<PlayerId> {
        self.advance_queue
            .iter()
            .flat_map(|q| q.player_ids())
            .collect()
    }

    pub fn is_playing(&self, id: PlayerId) -> bool {
        self.matches.iter().any(|m| m.contains(id))
    }

    pub fn is_reserved(&self, id: PlayerId) -> bool {
        self.advance_queue.iter().any(|q| q.contains(id))
    }

    pub fn is_removed(&self, id: PlayerId) -> bool {
        self.removed_players.iter().any(|r| r.player.id == id)
    }

    /// A live player other than `except` already goes by `name`, ignoring case.
    pub fn live_name_taken(&self, name: &str, except: Option<PlayerId>) -> bool {
        self.players
            .values()
            .filter(|p| Some(p.id) != except)
            .any(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Waiting players in queue order, skipping anyone playing or reserved.
    pub fn waiting_players(&self) -> Vec<&Player> {
        let busy: HashSet<PlayerId> = self
            .playing_ids()
            .union(&self.reserved_ids())
            .copied()
            .collect();
        self.queue
            .iter()
            .filter(|id| !busy.contains(id))
            .filter_map(|id| self.players.get(id))
            .collect()
    }

    /// Put a player back at the end of Waiting unless it is already there, on court,
    /// reserved, or no longer live.
    pub fn release_to_waiting(&mut self, id: PlayerId) {
        if !self.players.contains_key(&id)
            || self.queue.contains(&id)
            || self.is_playing(id)
            || self.is_reserved(id)
        {
            return;
        }
        self.queue.push(id);
    }

    pub fn take_from_waiting(&mut self, ids: &[PlayerId]) {
        self.queue.retain(|id| !ids.contains(id));
    }

    /// Membership and court-exclusivity check over the whole state.
    ///
    /// Returns a description of every violation found; empty means consistent.
    pub fn consistency_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen: HashSet<PlayerId> = HashSet::new();

        let slots = self
            .queue
            .iter()
            .map(|id| (*id, "waiting"))
            .chain(
                self.matches
                    .iter()
                    .flat_map(|m| m.player_ids())
                    .map(|id| (id, "playing")),
            )
            .chain(
                self.advance_queue
                    .iter()
                    .flat_map(|q| q.player_ids())
                    .map(|id| (id, "reserved")),
            );
        for (id, slot) in slots {
            if !self.players.contains_key(&id) {
                errors.push(format!("{} is {} but not a live player", id, slot));
            }
            if !seen.insert(id) {
                errors.push(format!("{} appears more than once ({})", id, slot));
            }
        }

        if self.phase == Phase::Active {
            for id in self.players.keys() {
                if !seen.contains(id) {
                    errors.push(format!("{} is live but not waiting, playing or reserved", id));
                }
            }
        } else if !self.queue.is_empty() || !self.matches.is_empty() || !self.advance_queue.is_empty() {
            errors.push("setup phase holds rotation state".to_string());
        }

        let mut courts: HashSet<CourtId> = HashSet::new();
        for m in &self.matches {
            if !courts.insert(m.court_id) {
                errors.push(format!("{} holds more than one match", m.court_id));
            }
            if self.court(m.court_id).is_none() {
                errors.push(format!("{} is on unknown {}", m.id, m.court_id));
            }
        }
        if self.courts.is_empty() {
            errors.push("no courts".to_string());
        }
        errors
    }
}
