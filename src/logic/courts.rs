//! Court allocation: which courts are free given the active matches.

use crate::models::{Court, CourtId, Match};
use std::collections::HashSet;

/// Ids of courts with no active match, in court order.
pub fn available_courts(matches: &[Match], courts: &[Court]) -> Vec<CourtId> {
    let used: HashSet<CourtId> = matches.iter().map(|m| m.court_id).collect();
    courts
        .iter()
        .map(|c| c.id)
        .filter(|id| !used.contains(id))
        .collect()
}

pub fn first_available_court(matches: &[Match], courts: &[Court]) -> Option<CourtId> {
    available_courts(matches, courts).into_iter().next()
}
