//! Completed-match ledger: frozen records of finished games, used for cost splitting.

use crate::models::ids::{CourtId, MatchId, PlayerId};
use crate::models::player::PlayerSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Historical record of a finished game. Only `voided`/`voided_at` ever change.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedMatchRecord {
    pub id: MatchId,
    pub court_id: CourtId,
    /// Court name at completion time.
    #[serde(default)]
    pub court_name: String,
    pub team_1: [PlayerSnapshot; 2],
    pub team_2: [PlayerSnapshot; 2],
    #[serde(default, with = "chrono::serde::ts_milliseconds")]
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub shuttle_used: u32,
    #[serde(default)]
    pub voided: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub voided_at: Option<DateTime<Utc>>,
}

impl CompletedMatchRecord {
    pub fn player_ids(&self) -> [PlayerId; 4] {
        [
            self.team_1[0].id,
            self.team_1[1].id,
            self.team_2[0].id,
            self.team_2[1].id,
        ]
    }
}

/// Result of flipping a record's void flag: what the counters must undo or redo.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VoidToggle {
    /// Status after the toggle. `true` means one game must be taken back from each player.
    pub voided: bool,
    pub shuttle_used: u32,
    pub players: [PlayerId; 4],
}

/// Append-only list of completed records, oldest first.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletedLedger(Vec<CompletedMatchRecord>);

impl CompletedLedger {
    pub fn append(&mut self, record: CompletedMatchRecord) {
        self.0.push(record);
    }

    pub fn get(&self, id: MatchId) -> Option<&CompletedMatchRecord> {
        self.0.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[CompletedMatchRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flip the void flag of one record. `None` if no record has this id.
    pub fn toggle_void(&mut self, id: MatchId, now: DateTime<Utc>) -> Option<VoidToggle> {
        let record = self.0.iter_mut().find(|r| r.id == id)?;
        record.voided = !record.voided;
        record.voided_at = record.voided.then_some(now);
        Some(VoidToggle {
            voided: record.voided,
            shuttle_used: record.shuttle_used,
            players: record.player_ids(),
        })
    }

    /// Shuttles used across non-voided games.
    pub fn total_shuttles_used(&self) -> u32 {
        self.0
            .iter()
            .filter(|r| !r.voided)
            .map(|r| r.shuttle_used)
            .sum()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
