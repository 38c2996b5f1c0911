//! Turns one event's raw results into places and points.

mod duration;
mod points;

pub use duration::{format_duration, parse_duration, parse_value};
pub use points::PointsTable;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use storage::models::Direction;

use crate::error::ParseError;
use crate::models::{EventResult, RawResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringEngine {
    points: PointsTable,
}

impl ScoringEngine {
    pub fn new(points: PointsTable) -> Self {
        Self { points }
    }

    pub fn points_table(&self) -> &PointsTable {
        &self.points
    }

    /// Scores one event.
    ///
    /// Equal values share a place and the next distinct value is placed after
    /// everyone ahead of it (1, 1, 3). Blank results rank after every parsed
    /// one. Any unparseable value fails the whole call. Results come back in
    /// input order.
    pub fn compute_event_points(
        &self,
        raw_results: &[RawResult],
        competitor_count: usize,
        direction: Direction,
    ) -> Result<Vec<EventResult>, ParseError> {
        let parsed = raw_results
            .iter()
            .map(|raw| {
                let text = raw.result.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                parse_value(text).map(Some).ok_or_else(|| ParseError {
                    name: raw.name.clone(),
                    raw: raw.result.clone(),
                })
            })
            .collect::<Result<Vec<Option<Decimal>>, ParseError>>()?;

        let mut order: Vec<usize> = (0..parsed.len()).collect();
        order.sort_by(|&a, &b| rank_order(parsed[a], parsed[b], direction));

        let mut places = vec![0u32; parsed.len()];
        for (position, &idx) in order.iter().enumerate() {
            places[idx] = match position {
                0 => 1,
                _ => {
                    let previous = order[position - 1];
                    if parsed[previous] == parsed[idx] {
                        places[previous]
                    } else {
                        position as u32 + 1
                    }
                }
            };
        }

        Ok(raw_results
            .iter()
            .zip(places)
            .map(|(raw, place)| EventResult {
                name: raw.name.clone(),
                result: raw.result.trim().to_string(),
                place: Some(place),
                points: Some(self.points.points_for(competitor_count, place)),
            })
            .collect())
    }
}

/// Better results sort first; blanks sort last.
fn rank_order(a: Option<Decimal>, b: Option<Decimal>, direction: Direction) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            Direction::High => b.cmp(&a),
            Direction::Low => a.cmp(&b),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> Vec<RawResult> {
        pairs.iter().map(|(n, r)| RawResult::new(*n, *r)).collect()
    }

    fn places(results: &[EventResult]) -> Vec<u32> {
        results.iter().map(|r| r.place.unwrap()).collect()
    }

    fn points(results: &[EventResult]) -> Vec<Decimal> {
        results.iter().map(|r| r.points.unwrap()).collect()
    }

    #[test]
    fn test_high_direction_with_tie() {
        let engine = ScoringEngine::default();
        let results = engine
            .compute_event_points(&raw(&[("A", "10"), ("B", "10"), ("C", "5")]), 3, Direction::High)
            .unwrap();

        assert_eq!(places(&results), vec![1, 1, 3]);
        assert_eq!(
            points(&results),
            vec![Decimal::from(3), Decimal::from(3), Decimal::from(1)]
        );
    }

    #[test]
    fn test_low_direction_mixes_times_and_seconds() {
        let engine = ScoringEngine::default();
        let results = engine
            .compute_event_points(
                &raw(&[("A", "65"), ("B", "1:05.00"), ("C", "0:58.3"), ("D", "1:10")]),
                4,
                Direction::Low,
            )
            .unwrap();

        assert_eq!(places(&results), vec![2, 2, 1, 4]);
        assert_eq!(results[0].points, results[1].points);
    }

    #[test]
    fn test_blank_results_rank_last() {
        let engine = ScoringEngine::default();
        let results = engine
            .compute_event_points(
                &raw(&[("A", ""), ("B", "100"), ("C", "  "), ("D", "120")]),
                4,
                Direction::High,
            )
            .unwrap();

        assert_eq!(places(&results), vec![3, 2, 3, 1]);
        assert_eq!(results[0].points, Some(Decimal::from(2)));
    }

    #[test]
    fn test_parse_error_is_atomic() {
        let engine = ScoringEngine::default();
        let err = engine
            .compute_event_points(&raw(&[("A", "10"), ("B", "dziesięć")]), 2, Direction::High)
            .unwrap_err();

        assert_eq!(
            err,
            ParseError {
                name: "B".to_string(),
                raw: "dziesięć".to_string()
            }
        );
    }

    #[test]
    fn test_better_value_always_better_place() {
        let engine = ScoringEngine::default();
        let input = raw(&[
            ("A", "7"),
            ("B", "3"),
            ("C", "7"),
            ("D", "9.5"),
            ("E", "3"),
            ("F", "1"),
        ]);
        let results = engine.compute_event_points(&input, 6, Direction::High).unwrap();
        let values: Vec<Decimal> = input.iter().map(|r| parse_value(&r.result).unwrap()).collect();

        for i in 0..results.len() {
            for j in 0..results.len() {
                if values[i] == values[j] {
                    assert_eq!(results[i].place, results[j].place);
                    assert_eq!(results[i].points, results[j].points);
                } else if values[i] > values[j] {
                    assert!(results[i].place < results[j].place);
                    assert!(results[i].points >= results[j].points);
                }
            }
        }
    }

    #[test]
    fn test_custom_table() {
        let table: PointsTable =
            serde_json::from_str(r#"{"table": {"3": [5, 3, 1]}}"#).unwrap();
        let engine = ScoringEngine::new(table);
        let results = engine
            .compute_event_points(&raw(&[("A", "1"), ("B", "2"), ("C", "2")]), 3, Direction::Low)
            .unwrap();

        assert_eq!(
            points(&results),
            vec![Decimal::from(5), Decimal::from(3), Decimal::from(3)]
        );
    }
}
