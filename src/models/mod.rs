//! Data structures for the court rotation: players, courts, matches, ledger, session state.

mod court;
mod game;
mod ids;
mod ledger;
mod player;
mod session;

pub use court::Court;
pub use game::{Match, QueuedMatch, Team};
pub use ids::{CourtId, IdGenerator, MatchId, PlayerId};
pub use ledger::{CompletedLedger, CompletedMatchRecord, VoidToggle};
pub use player::{Category, Gender, Player, PlayerSnapshot, RemovedPlayer, ShuttleShare};
pub use session::{NoOpReason, Phase, SessionState};
