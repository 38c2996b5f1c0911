use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

use crate::error::ValidationError;
use crate::models::CompetitionState;

const REQUIRED_FIELDS: [&str; 2] = ["competitors", "eventHistory"];

/// Checks imported state documents before they are allowed anywhere near the
/// live competition.
pub struct StateValidator;

impl StateValidator {
    /// Parses and checks an exported document.
    pub fn parse_document(text: &str) -> Result<(CompetitionState, ValidationReport), ValidationError> {
        let value: Value = serde_json::from_str(text)?;
        Self::parse_value(value)
    }

    pub fn parse_value(value: Value) -> Result<(CompetitionState, ValidationReport), ValidationError> {
        let Some(object) = value.as_object() else {
            return Err(ValidationError::NotAnObject);
        };
        for field in REQUIRED_FIELDS {
            match object.get(field) {
                Some(Value::Array(_)) => {}
                _ => return Err(ValidationError::MissingField(field)),
            }
        }

        let state: CompetitionState = serde_json::from_value(value)?;
        let report = Self::validate(&state);
        if !report.errors.is_empty() {
            return Err(ValidationError::Invalid(report.errors));
        }
        Ok((state, report))
    }

    /// Cross-field checks. Only problems that would break scoring are errors;
    /// inconsistencies the app can live with are warnings.
    pub fn validate(state: &CompetitionState) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut names = HashSet::new();
        for name in &state.competitors {
            if name.trim().is_empty() {
                report
                    .errors
                    .push("Competitor name cannot be empty".to_string());
            } else if !names.insert(name.as_str()) {
                report
                    .errors
                    .push(format!("Duplicate competitor: '{}'", name));
            }
        }

        if state.event_number == 0 {
            report
                .errors
                .push("Event number must be >= 1".to_string());
        }

        let mut numbers = HashSet::new();
        let mut previous_nr = 0;
        for event in &state.event_history {
            if !numbers.insert(event.nr) {
                report
                    .errors
                    .push(format!("Duplicate event number: {}", event.nr));
            }
            if event.nr <= previous_nr {
                report.warnings.push(format!(
                    "Event {} '{}' is out of order (after event {})",
                    event.nr, event.name, previous_nr
                ));
            }
            previous_nr = previous_nr.max(event.nr);

            for result in &event.results {
                if !names.contains(result.name.as_str()) {
                    report.warnings.push(format!(
                        "Event {} has a result for unknown competitor '{}'",
                        event.nr, result.name
                    ));
                }
                if result.points.is_some_and(|p| p.is_sign_negative()) {
                    report.warnings.push(format!(
                        "Event {}, competitor '{}': negative points",
                        event.nr, result.name
                    ));
                }
            }
        }

        for name in &state.competitors {
            if !state.scores.contains_key(name) {
                report
                    .warnings
                    .push(format!("Competitor '{}' has no score entry", name));
                continue;
            }
            let total = state.history_total(name);
            let score = state.score_of(name);
            if total != score {
                report.warnings.push(format!(
                    "Score of '{}' is {} but event points add up to {}",
                    name, score, total
                ));
            }
        }

        report
    }
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}
