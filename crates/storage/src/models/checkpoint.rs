use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A named snapshot of the whole competition state.
///
/// The state is stored as an already sanitized JSON tree so the storage layer
/// does not depend on the competition model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub key: String,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub state: Value,
}

impl CheckpointRecord {
    /// Builds a record with a fresh key. Without a name the label falls back
    /// to the creation time.
    pub fn new(name: Option<String>, state: Value) -> Self {
        // Stored with millisecond precision.
        let timestamp = Utc::now().trunc_subsecs(3);
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Checkpoint {}", timestamp.to_rfc3339()));

        Self {
            key: generate_key(),
            name,
            timestamp,
            state,
        }
    }
}

pub(crate) fn generate_key() -> String {
    format!("cp_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unnamed_checkpoint_gets_timestamp_label() {
        let record = CheckpointRecord::new(Some("   ".to_string()), json!({}));
        assert!(record.name.starts_with("Checkpoint "));
        assert!(record.key.starts_with("cp_"));
    }

    #[test]
    fn test_timestamp_serializes_as_millis() {
        let record = CheckpointRecord::new(Some("After event 2".to_string()), json!({"a": 1}));
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["timestamp"].is_i64());
        assert_eq!(value["name"], "After event 2");
    }
}
