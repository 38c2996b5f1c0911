use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Direction;

/// Catalog entry for an event that can be picked when a competition event starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EventDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Event name must be between 1 and 255 characters"
    ))]
    pub name: String,

    #[serde(rename = "type", default)]
    pub direction: Direction,
}

impl EventDefinition {
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            id: None,
            name: name.into(),
            direction,
        }
    }
}
