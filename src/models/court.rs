//! Court: a named playing slot.

use crate::models::ids::CourtId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub name: String,
}

impl Court {
    pub fn new(id: CourtId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Name given to the `ordinal`-th court when the operator doesn't supply one.
    pub fn default_name(ordinal: usize) -> String {
        format!("Court {ordinal}")
    }
}
