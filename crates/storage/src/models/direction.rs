use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which way raw results rank for an event.
///
/// `High` is for loads and repetitions, `Low` for elapsed times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    High,
    Low,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "more" | "max" => Ok(Self::High),
            "low" | "less" | "min" | "time" => Ok(Self::Low),
            other => Err(format!(
                "Unknown direction '{}'. Expected 'high' or 'low'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("high".parse::<Direction>().unwrap(), Direction::High);
        assert_eq!(" LOW ".parse::<Direction>().unwrap(), Direction::Low);
        assert_eq!("time".parse::<Direction>().unwrap(), Direction::Low);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_serde_is_lowercase() {
        let json = serde_json::to_string(&Direction::Low).unwrap();
        assert_eq!(json, "\"low\"");
        let back: Direction = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(back, Direction::High);
    }
}
