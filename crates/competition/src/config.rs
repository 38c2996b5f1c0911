use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::persistence::DEFAULT_AUTOSAVE_DELAY;
use crate::scoring::PointsTable;

/// Tunables of a scoring session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompetitionConfig {
    pub history_depth: usize,
    #[serde(with = "millis")]
    pub autosave_delay: Duration,
    pub points: PointsTable,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            points: PointsTable::default(),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: CompetitionConfig = serde_json::from_str(r#"{"autosaveDelay": 250}"#).unwrap();
        assert_eq!(config.autosave_delay, Duration::from_millis(250));
        assert_eq!(config.history_depth, DEFAULT_HISTORY_DEPTH);
        assert_eq!(config.points, PointsTable::Linear);
    }
}
