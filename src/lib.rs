//! Badminton doubles court rotation: library with models, match assembly and the
//! state transition engine.

pub mod logic;
pub mod models;
pub mod snapshot;
pub mod store;

pub use logic::{
    apply, apply_or_keep, assemble, available_courts, can_create_match, summarize,
    AssembleOptions, Assembly, CostInputs, Operation, PhaseScope, PlayerEdit, Proposal,
    SessionSummary,
};
pub use models::{
    Category, CompletedMatchRecord, Court, CourtId, Gender, Match, MatchId, NoOpReason, Phase,
    Player, PlayerId, QueuedMatch, RemovedPlayer, SessionState, ShuttleShare,
};
pub use snapshot::SnapshotError;
pub use store::{SnapshotStore, WriteSlot};
