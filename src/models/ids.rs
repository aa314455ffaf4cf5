//! Entity identifiers (players, courts, matches) and the per-session id generator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Id as it may appear in a stored snapshot: a bare number (older snapshots) or a string
/// such as `"p-3"`, `"court-2"` or `"7"`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

/// Numeric suffix of an id string (`"c-12"` -> 12). `None` if the string has no trailing digits.
fn numeric_suffix(s: &str) -> Option<u64> {
    let s = s.trim();
    let digits_at = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    s[digits_at..].parse().ok()
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(try_from = "RawId", into = "String")]
        pub struct $name(u64);

        impl $name {
            pub fn new(number: u64) -> Self {
                Self(number)
            }

            /// Numeric part of the id, used to reseed the generator after a reload.
            pub fn number(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_string()
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                numeric_suffix(s)
                    .map(Self)
                    .ok_or_else(|| format!("invalid {} id: {:?}", $prefix, s))
            }
        }

        impl TryFrom<RawId> for $name {
            type Error = String;

            fn try_from(raw: RawId) -> Result<Self, Self::Error> {
                match raw {
                    RawId::Number(n) => Ok(Self(n)),
                    RawId::Text(s) => s.parse(),
                }
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a player (`p-N`).
    PlayerId,
    "p"
);
entity_id!(
    /// Unique identifier for a court (`c-N`).
    CourtId,
    "c"
);
entity_id!(
    /// Unique identifier for an active match, a queued match, and the completed record
    /// it eventually becomes (`m-N`).
    MatchId,
    "m"
);

/// Monotonic id counters owned by one session.
///
/// Never persisted: after a snapshot is loaded the counters are reseeded with
/// `max(existing numeric suffix) + 1` via [`IdGenerator::reseed`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdGenerator {
    next_player: u64,
    next_court: u64,
    next_match: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self {
            next_player: 1,
            next_court: 1,
            next_match: 1,
        }
    }
}

impl IdGenerator {
    pub fn next_player(&mut self) -> PlayerId {
        let id = PlayerId(self.next_player);
        self.next_player += 1;
        id
    }

    pub fn next_court(&mut self) -> CourtId {
        let id = CourtId(self.next_court);
        self.next_court += 1;
        id
    }

    pub fn next_match(&mut self) -> MatchId {
        let id = MatchId(self.next_match);
        self.next_match += 1;
        id
    }

    /// Counters positioned after the largest ids already in use.
    pub fn reseed(
        players: impl IntoIterator<Item = PlayerId>,
        courts: impl IntoIterator<Item = CourtId>,
        matches: impl IntoIterator<Item = MatchId>,
    ) -> Self {
        Self {
            next_player: players.into_iter().map(|id| id.0).max().unwrap_or(0) + 1,
            next_court: courts.into_iter().map(|id| id.0).max().unwrap_or(0) + 1,
            next_match: matches.into_iter().map(|id| id.0).max().unwrap_or(0) + 1,
        }
    }
}
