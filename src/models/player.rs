//! Player, its fairness counters, and the frozen snapshot kept in completed-match records.

use crate::models::ids::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Skill category used for team balancing.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "Beginners", alias = "Beginner")]
    Beginner,
    Intermediate,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Gender {
    /// Older snapshots carry no gender; they load as `Male`.
    #[default]
    Male,
    Female,
}

/// Accumulated shuttlecock cost liability, stored in exact quarter-shuttle units.
///
/// Serialized as a plain number of shuttles (`1.75`) and rounded to the nearest quarter on load.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShuttleShare(u32);

impl ShuttleShare {
    pub const ZERO: ShuttleShare = ShuttleShare(0);

    pub fn from_quarters(quarters: u32) -> Self {
        Self(quarters)
    }

    /// One player's share of a game that used `shuttles_used` shuttles (split four ways).
    pub fn per_player(shuttles_used: u32) -> Self {
        Self(shuttles_used)
    }

    /// Nearest quarter; negative and non-finite values clamp to zero.
    pub fn from_shuttles(shuttles: f64) -> Self {
        if !shuttles.is_finite() || shuttles <= 0.0 {
            return Self::ZERO;
        }
        Self((shuttles * 4.0).round().min(u32::MAX as f64) as u32)
    }

    pub fn quarters(self) -> u32 {
        self.0
    }

    pub fn as_shuttles(self) -> f64 {
        f64::from(self.0) / 4.0
    }

    /// Subtraction floored at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for ShuttleShare {
    type Output = ShuttleShare;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for ShuttleShare {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl std::iter::Sum for ShuttleShare {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Renders as whole shuttles plus quarters: `0`, `3/4`, `2`, `1 1/4`.
impl fmt::Display for ShuttleShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (whole, rem) = (self.0 / 4, self.0 % 4);
        match (whole, rem) {
            (w, 0) => write!(f, "{w}"),
            (0, r) => write!(f, "{r}/4"),
            (w, r) => write!(f, "{w} {r}/4"),
        }
    }
}

impl Serialize for ShuttleShare {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_shuttles())
    }
}

impl<'de> Deserialize<'de> for ShuttleShare {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let shuttles = Option::<f64>::deserialize(deserializer)?;
        Ok(shuttles.map(Self::from_shuttles).unwrap_or_default())
    }
}

/// A participant in the rotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub gender: Gender,
    /// Non-voided completed games.
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub shuttle_share: ShuttleShare,
    #[serde(default, with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
}

impl Player {
    /// Create a new player. Counters start at zero.
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        category: Category,
        gender: Gender,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            gender,
            games_played: 0,
            shuttle_share: ShuttleShare::ZERO,
            added_at,
        }
    }

    /// Record one played game and this player's part of its shuttles.
    pub fn record_game(&mut self, shuttles_used: u32) {
        self.games_played += 1;
        self.shuttle_share += ShuttleShare::per_player(shuttles_used);
    }

    /// Take back one game (void). Both counters floor at zero.
    pub fn revert_game(&mut self, shuttles_used: u32) {
        self.games_played = self.games_played.saturating_sub(1);
        self.shuttle_share = self
            .shuttle_share
            .saturating_sub(ShuttleShare::per_player(shuttles_used));
    }

    pub fn reset_counters(&mut self) {
        self.games_played = 0;
        self.shuttle_share = ShuttleShare::ZERO;
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            category: self.category,
            gender: self.gender,
        }
    }
}

/// A player taken out of an active rotation. Counters are kept so cost totals stay attributable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedPlayer {
    #[serde(flatten)]
    pub player: Player,
    #[serde(default, with = "chrono::serde::ts_milliseconds")]
    pub removed_at: DateTime<Utc>,
}

/// Player identity frozen at completion time; later edits never rewrite it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub gender: Gender,
}
