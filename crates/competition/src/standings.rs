use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::CompetitionState;
use crate::tiebreak::{TieBreak, break_tie};

/// One row of the final classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub place: u32,
    pub name: String,
    pub score: Decimal,
    /// Set on the competitor who won a tie against the next row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tie_break: Option<TieBreak>,
}

/// Orders active competitors by cumulative score, separating equal totals
/// with [`break_tie`]. Competitors whose tie stays undecided share a place.
pub fn final_standings(state: &CompetitionState) -> Vec<Standing> {
    let mut order: Vec<(&str, Decimal)> = state
        .competitors
        .iter()
        .map(|name| (name.as_str(), state.score_of(name)))
        .collect();
    order.sort_by(|a, b| b.1.cmp(&a.1));

    // The pairwise comparison is not guaranteed to be transitive across three
    // or more tied competitors, so equal-score runs are ordered by insertion
    // rather than handed to sort_by.
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && order[end].1 == order[start].1 {
            end += 1;
        }
        for i in start + 1..end {
            let mut j = i;
            while j > start && break_tie(order[j].0, order[j - 1].0, &state.event_history).outcome.is_lt() {
                order.swap(j, j - 1);
                j -= 1;
            }
        }
        start = end;
    }

    let mut standings: Vec<Standing> = Vec::with_capacity(order.len());
    for (i, (name, score)) in order.iter().enumerate() {
        let mut place = i as u32 + 1;
        if let Some(previous) = standings.last_mut() {
            if previous.score == *score {
                let tie = break_tie(&previous.name, name, &state.event_history);
                if tie.is_undecided() {
                    place = previous.place;
                } else {
                    previous.tie_break = Some(tie);
                }
            }
        }
        standings.push(Standing {
            place,
            name: name.to_string(),
            score: *score,
            tie_break: None,
        });
    }
    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompetitionEvent, EventResult};
    use crate::tiebreak::TieBreakReason;
    use storage::models::Direction;

    fn state(events: Vec<Vec<(&str, u32, i64)>>) -> CompetitionState {
        let mut state = CompetitionState::default();
        for (i, rows) in events.into_iter().enumerate() {
            let results: Vec<EventResult> = rows
                .into_iter()
                .map(|(name, place, points)| EventResult {
                    name: name.to_string(),
                    result: String::new(),
                    place: Some(place),
                    points: Some(Decimal::from(points)),
                })
                .collect();
            for r in &results {
                if !state.competitors.contains(&r.name) {
                    state.competitors.push(r.name.clone());
                }
                *state.scores.entry(r.name.clone()).or_default() += r.points.unwrap();
            }
            state.event_history.push(CompetitionEvent {
                nr: i as u32 + 1,
                name: format!("E{}", i + 1),
                direction: Direction::High,
                results,
            });
        }
        state
    }

    fn names(standings: &[Standing]) -> Vec<&str> {
        standings.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_orders_by_score() {
        let state = state(vec![vec![("A", 3, 1), ("B", 1, 3), ("C", 2, 2)]]);
        let standings = final_standings(&state);

        assert_eq!(names(&standings), vec!["B", "C", "A"]);
        assert_eq!(standings.iter().map(|s| s.place).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(standings.iter().all(|s| s.tie_break.is_none()));
    }

    #[test]
    fn test_resolved_tie_marks_winner() {
        let state = state(vec![
            vec![("A", 1, 3), ("B", 3, 1), ("C", 2, 2)],
            vec![("A", 2, 1), ("B", 1, 3), ("C", 3, 0)],
        ]);
        let standings = final_standings(&state);

        assert_eq!(names(&standings), vec!["B", "A", "C"]);
        assert_eq!(standings[0].place, 1);
        assert_eq!(standings[1].place, 2);
        let tie = standings[0].tie_break.as_ref().unwrap();
        assert_eq!(tie.reason, TieBreakReason::LatestSharedEvent { nr: 2, event: "E2".to_string() });
        assert!(standings[1].tie_break.is_none());
    }

    #[test]
    fn test_undecided_tie_shares_place() {
        let state = state(vec![vec![("A", 1, 3), ("B", 1, 3), ("C", 3, 1)]]);
        let standings = final_standings(&state);

        assert_eq!(names(&standings), vec!["A", "B", "C"]);
        assert_eq!(standings.iter().map(|s| s.place).collect::<Vec<_>>(), vec![1, 1, 3]);
        assert!(standings[0].tie_break.is_none());
    }

    #[test]
    fn test_missing_score_counts_as_zero() {
        let mut state = state(vec![vec![("A", 1, 2), ("B", 2, 1)]]);
        state.competitors.push("Late".to_string());

        let standings = final_standings(&state);
        assert_eq!(standings.last().unwrap().name, "Late");
        assert_eq!(standings.last().unwrap().score, Decimal::ZERO);
    }
}
