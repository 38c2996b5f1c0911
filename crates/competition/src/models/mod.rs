mod number;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use storage::models::Direction;

pub const DEFAULT_EVENT_TITLE_PREFIX: &str = "Konkurencja";

pub fn default_event_title(event_number: u32) -> String {
    format!("{} {}", DEFAULT_EVENT_TITLE_PREFIX, event_number)
}

/// A result as typed by the operator, before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    pub name: String,
    #[serde(default, deserialize_with = "number::raw_text")]
    pub result: String,
}

impl RawResult {
    pub fn new(name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: result.into(),
        }
    }
}

/// One competitor's line in a scored event. `place` and `points` stay empty
/// until the scoring engine has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResult {
    pub name: String,
    #[serde(default, deserialize_with = "number::raw_text")]
    pub result: String,
    #[serde(default)]
    pub place: Option<u32>,
    #[serde(default, with = "number::option")]
    pub points: Option<Decimal>,
}

impl EventResult {
    pub fn raw(&self) -> RawResult {
        RawResult::new(&self.name, &self.result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionEvent {
    pub nr: u32,
    pub name: String,
    #[serde(rename = "type", default)]
    pub direction: Direction,
    pub results: Vec<EventResult>,
}

impl CompetitionEvent {
    pub fn result_for(&self, name: &str) -> Option<&EventResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Points a competitor earned here, zero when absent or unscored.
    pub fn points_for(&self, name: &str) -> Decimal {
        self.result_for(name)
            .and_then(|r| r.points)
            .unwrap_or_default()
    }

    pub fn raw_results(&self) -> Vec<RawResult> {
        self.results.iter().map(EventResult::raw).collect()
    }
}

/// Everything needed to resume a competition. This is the shape of exported
/// documents, autosaves and checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionState {
    pub competitors: Vec<String>,
    #[serde(default, with = "number::map")]
    pub scores: BTreeMap<String, Decimal>,
    #[serde(default = "first_event")]
    pub event_number: u32,
    pub event_history: Vec<CompetitionEvent>,
    #[serde(default)]
    pub current_event_type: Direction,
    #[serde(default = "first_event_title")]
    pub event_title: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event_location: String,
    #[serde(default)]
    pub logo_data: Option<String>,
}

fn first_event() -> u32 {
    1
}

fn first_event_title() -> String {
    default_event_title(1)
}

impl Default for CompetitionState {
    fn default() -> Self {
        Self {
            competitors: Vec::new(),
            scores: BTreeMap::new(),
            event_number: first_event(),
            event_history: Vec::new(),
            current_event_type: Direction::High,
            event_title: first_event_title(),
            event_name: String::new(),
            event_location: String::new(),
            logo_data: None,
        }
    }
}

impl CompetitionState {
    pub fn is_started(&self) -> bool {
        !self.competitors.is_empty()
    }

    pub fn score_of(&self, name: &str) -> Decimal {
        self.scores.get(name).copied().unwrap_or_default()
    }

    pub fn event(&self, nr: u32) -> Option<&CompetitionEvent> {
        self.event_history.iter().find(|e| e.nr == nr)
    }

    pub fn last_event(&self) -> Option<&CompetitionEvent> {
        self.event_history.last()
    }

    /// Whether the event currently on the board already has points.
    pub fn current_event_scored(&self) -> bool {
        self.event(self.event_number).is_some()
    }

    /// Sum of a competitor's points over the whole event history.
    pub fn history_total(&self, name: &str) -> Decimal {
        self.event_history.iter().map(|e| e.points_for(name)).sum()
    }
}
