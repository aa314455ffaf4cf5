//! Rotation business logic: match assembly, court allocation, and the transition engine.

pub mod accounting;
pub mod assembler;
pub mod courts;
pub mod engine;
pub mod matches;
pub mod roster;
pub mod summary;

pub use accounting::{reset_games, toggle_void};
pub use assembler::{assemble, AssembleOptions, Assembly, Proposal};
pub use courts::{available_courts, first_available_court};
pub use engine::{apply, apply_or_keep, Operation, PhaseScope};
pub use matches::can_create_match;
pub use roster::{PlayerEdit, MIN_PLAYERS_TO_START};
pub use summary::{summarize, CostInputs, SessionSummary};
