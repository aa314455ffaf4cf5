//! End-of-session summary: games per player and each player's part of the court and
//! shuttlecock costs. Money is in cents.

use crate::models::{Category, Gender, Player, PlayerId, SessionState, ShuttleShare};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;

/// Costs entered by the operator when closing the session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostInputs {
    #[serde(default)]
    pub total_court_cost_cents: u64,
    #[serde(default)]
    pub cost_per_shuttle_cents: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCostLine {
    pub id: PlayerId,
    pub name: String,
    pub category: Category,
    pub gender: Gender,
    pub games_played: u32,
    pub shuttle_share: ShuttleShare,
    /// Player was taken out of the rotation before the end.
    pub removed: bool,
    pub court_share_cents: u64,
    pub shuttle_cost_cents: u64,
    pub total_cents: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Most games first, then by name.
    pub players: Vec<PlayerCostLine>,
    pub total_games: u32,
    /// Shuttles used across non-voided completed games.
    pub total_shuttles_used: u32,
    pub court_share_per_player_cents: u64,
    pub total_shuttle_cost_cents: u64,
}

/// `numerator / denominator` rounded half up, saturating at `u64::MAX`.
fn div_round(numerator: u128, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    let denominator = u128::from(denominator);
    let quotient = (numerator + denominator / 2) / denominator;
    u64::try_from(quotient).unwrap_or(u64::MAX)
}

/// `1234567` -> `"12,345.67"`; whole amounts drop the decimals (`"12,345"`).
pub fn format_cents(cents: u64) -> String {
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match cents % 100 {
        0 => grouped,
        rest => format!("{grouped}.{rest:02}"),
    }
}

/// Build the summary over live and removed players.
pub fn summarize(state: &SessionState, costs: CostInputs) -> SessionSummary {
    let mut everyone: BTreeMap<PlayerId, (&Player, bool)> = BTreeMap::new();
    let all = state
        .players
        .values()
        .map(|p| (p, false))
        .chain(state.removed_players.iter().map(|r| (&r.player, true)));
    for (p, removed) in all {
        let keep = everyone
            .get(&p.id)
            .map_or(true, |(existing, _)| p.games_played > existing.games_played);
        if keep {
            everyone.insert(p.id, (p, removed));
        }
    }

    let count = everyone.len() as u64;
    let court_share = div_round(u128::from(costs.total_court_cost_cents), count);

    let mut players: Vec<PlayerCostLine> = everyone
        .into_values()
        .map(|(p, removed)| {
            let shuttle_cost = div_round(
                u128::from(p.shuttle_share.quarters()) * u128::from(costs.cost_per_shuttle_cents),
                4,
            );
            PlayerCostLine {
                id: p.id,
                name: p.name.clone(),
                category: p.category,
                gender: p.gender,
                games_played: p.games_played,
                shuttle_share: p.shuttle_share,
                removed,
                court_share_cents: court_share,
                shuttle_cost_cents: shuttle_cost,
                total_cents: court_share.saturating_add(shuttle_cost),
            }
        })
        .collect();
    players.sort_by(|a, b| {
        b.games_played
            .cmp(&a.games_played)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    SessionSummary {
        total_games: players.iter().map(|p| p.games_played).sum(),
        total_shuttles_used: state.completed_matches.total_shuttles_used(),
        court_share_per_player_cents: court_share,
        total_shuttle_cost_cents: players
            .iter()
            .fold(0, |sum: u64, p| sum.saturating_add(p.shuttle_cost_cents)),
        players,
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    category: Category,
    gender: Gender,
    games: u32,
    shuttles: String,
    court_share: String,
    shuttle_cost: String,
    total: String,
    status: &'static str,
}

impl SessionSummary {
    /// One row per player, with a header line.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        for line in &self.players {
            wtr.serialize(CsvRow {
                name: &line.name,
                category: line.category,
                gender: line.gender,
                games: line.games_played,
                shuttles: line.shuttle_share.to_string(),
                court_share: format_cents(line.court_share_cents),
                shuttle_cost: format_cents(line.shuttle_cost_cents),
                total: format_cents(line.total_cents),
                status: if line.removed { "removed" } else { "active" },
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
