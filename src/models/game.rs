//! Active matches (bound to a court) and advance-queue entries (waiting for one).

use crate::models::ids::{CourtId, MatchId, PlayerId};
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Two player ids. Teams are always doubles.
pub type Team = [PlayerId; 2];

/// A team member as stored: a bare id, or a whole player object in older snapshots.
#[derive(Deserialize)]
#[serde(untagged)]
enum TeamEntry {
    Id(PlayerId),
    Player { id: PlayerId },
}

fn deserialize_team<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Team, D::Error> {
    let entries = Vec::<TeamEntry>::deserialize(deserializer)?;
    let ids: Vec<PlayerId> = entries
        .into_iter()
        .map(|e| match e {
            TeamEntry::Id(id) | TeamEntry::Player { id } => id,
        })
        .collect();
    let len = ids.len();
    ids.try_into()
        .map_err(|_| D::Error::invalid_length(len, &"a team of exactly two players"))
}

/// A team pairing occupying one court.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub court_id: CourtId,
    #[serde(deserialize_with = "deserialize_team")]
    pub team_1: Team,
    #[serde(deserialize_with = "deserialize_team")]
    pub team_2: Team,
    #[serde(default, with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn new(
        id: MatchId,
        court_id: CourtId,
        team_1: Team,
        team_2: Team,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            court_id,
            team_1,
            team_2,
            created_at,
        }
    }

    /// All four players, team 1 first.
    pub fn player_ids(&self) -> [PlayerId; 4] {
        [self.team_1[0], self.team_1[1], self.team_2[0], self.team_2[1]]
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.player_ids().contains(&player_id)
    }
}

/// A pre-assembled match waiting for a free court. Its players are reserved.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMatch {
    pub id: MatchId,
    #[serde(deserialize_with = "deserialize_team")]
    pub team_1: Team,
    #[serde(deserialize_with = "deserialize_team")]
    pub team_2: Team,
    #[serde(default, with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl QueuedMatch {
    pub fn player_ids(&self) -> [PlayerId; 4] {
        [self.team_1[0], self.team_1[1], self.team_2[0], self.team_2[1]]
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.player_ids().contains(&player_id)
    }

    /// Bind to a court. The match keeps the queued id; its start time is the promotion time.
    pub fn promote(self, court_id: CourtId, now: DateTime<Utc>) -> Match {
        Match::new(self.id, court_id, self.team_1, self.team_2, now)
    }
}
