use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::models::CompetitionEvent;

pub const UNDECIDED_REASON: &str = "Remis nierozstrzygnięty";

/// Why one of two competitors with equal totals ranks ahead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TieBreakReason {
    /// More points in the latest event both contested where their points differ.
    LatestSharedEvent { nr: u32, event: String },
    /// More event wins across shared events.
    MoreEventWins { wins: usize, other: usize },
    Undecided,
}

impl fmt::Display for TieBreakReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LatestSharedEvent { nr, event } => {
                write!(f, "więcej punktów w konkurencji {} ({})", nr, event)
            }
            Self::MoreEventWins { wins, other } => {
                write!(f, "więcej wygranych konkurencji ({} do {})", wins, other)
            }
            Self::Undecided => f.write_str(UNDECIDED_REASON),
        }
    }
}

/// Outcome of comparing two competitors. `Ordering::Less` means the first
/// one ranks ahead, mirroring what a sort comparator expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TieBreak {
    #[serde(serialize_with = "serialize_outcome")]
    pub outcome: Ordering,
    pub reason: TieBreakReason,
}

impl TieBreak {
    fn decided(outcome: Ordering, reason: TieBreakReason) -> Self {
        Self { outcome, reason }
    }

    pub fn undecided() -> Self {
        Self {
            outcome: Ordering::Equal,
            reason: TieBreakReason::Undecided,
        }
    }

    pub fn is_undecided(&self) -> bool {
        self.outcome == Ordering::Equal
    }
}

/// `-1`, `0` or `1`, as the browser app exported it.
fn serialize_outcome<S: serde::Serializer>(outcome: &Ordering, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i8(*outcome as i8)
}

/// Separates two competitors with equal cumulative score by looking at the
/// events both of them took part in.
///
/// The latest shared event where their points differ decides first; failing
/// that, whoever won more shared events. Only the event numbers matter, so the
/// order of `history` has no effect on the outcome.
pub fn break_tie(a: &str, b: &str, history: &[CompetitionEvent]) -> TieBreak {
    let mut shared: Vec<&CompetitionEvent> = history
        .iter()
        .filter(|e| e.result_for(a).is_some() && e.result_for(b).is_some())
        .collect();
    shared.sort_by(|x, y| y.nr.cmp(&x.nr).then_with(|| x.name.cmp(&y.name)));

    for event in &shared {
        let (pa, pb) = (event.points_for(a), event.points_for(b));
        if pa != pb {
            return TieBreak::decided(
                pb.cmp(&pa),
                TieBreakReason::LatestSharedEvent {
                    nr: event.nr,
                    event: event.name.clone(),
                },
            );
        }
    }

    let wins = |name: &str| {
        shared
            .iter()
            .filter(|e| e.result_for(name).and_then(|r| r.place) == Some(1))
            .count()
    };
    let (wins_a, wins_b) = (wins(a), wins(b));
    if wins_a != wins_b {
        let (wins, other) = (wins_a.max(wins_b), wins_a.min(wins_b));
        return TieBreak::decided(
            wins_b.cmp(&wins_a),
            TieBreakReason::MoreEventWins { wins, other },
        );
    }

    TieBreak::undecided()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventResult;
    use rust_decimal::Decimal;
    use storage::models::Direction;

    fn event(nr: u32, rows: &[(&str, u32, i64)]) -> CompetitionEvent {
        CompetitionEvent {
            nr,
            name: format!("Konkurencja {}", nr),
            direction: Direction::High,
            results: rows
                .iter()
                .map(|(name, place, points)| EventResult {
                    name: name.to_string(),
                    result: points.to_string(),
                    place: Some(*place),
                    points: Some(Decimal::from(*points)),
                })
                .collect(),
        }
    }

    #[test]
    fn test_latest_differing_event_decides() {
        let history = vec![
            event(1, &[("A", 1, 3), ("B", 3, 1)]),
            event(2, &[("A", 3, 1), ("B", 1, 3)]),
            event(3, &[("A", 1, 3), ("B", 1, 3)]),
        ];

        let result = break_tie("A", "B", &history);
        assert_eq!(result.outcome, Ordering::Greater);
        assert_eq!(
            result.reason,
            TieBreakReason::LatestSharedEvent {
                nr: 2,
                event: "Konkurencja 2".to_string()
            }
        );
        assert_eq!(result.reason.to_string(), "więcej punktów w konkurencji 2 (Konkurencja 2)");
    }

    #[test]
    fn test_event_wins_decide_when_points_match() {
        // Points always equal, but A holds a shared first place alone in
        // event 2 while B has none.
        let history = vec![
            event(1, &[("A", 2, 2), ("B", 2, 2), ("C", 1, 3)]),
            event(2, &[("A", 1, 3), ("B", 2, 3)]),
        ];

        let result = break_tie("A", "B", &history);
        assert_eq!(result.outcome, Ordering::Less);
        assert_eq!(result.reason, TieBreakReason::MoreEventWins { wins: 1, other: 0 });
    }

    #[test]
    fn test_undecided() {
        let history = vec![event(1, &[("A", 1, 2), ("B", 1, 2)])];

        let result = break_tie("A", "B", &history);
        assert!(result.is_undecided());
        assert_eq!(result.reason.to_string(), UNDECIDED_REASON);
        assert_eq!(result.outcome, Ordering::Equal);
    }

    #[test]
    fn test_only_shared_events_count() {
        let history = vec![
            event(1, &[("A", 1, 3), ("B", 2, 2)]),
            event(2, &[("A", 1, 5), ("C", 2, 4)]),
        ];

        let result = break_tie("B", "A", &history);
        assert_eq!(result.outcome, Ordering::Greater);
        assert_eq!(
            result.reason,
            TieBreakReason::LatestSharedEvent {
                nr: 1,
                event: "Konkurencja 1".to_string()
            }
        );
    }

    #[test]
    fn test_symmetric_and_history_order_independent() {
        let mut history = vec![
            event(1, &[("A", 2, 2), ("B", 1, 3), ("C", 3, 1)]),
            event(2, &[("A", 1, 3), ("B", 3, 1), ("C", 2, 2)]),
            event(3, &[("A", 2, 2), ("B", 2, 2), ("C", 1, 3)]),
        ];
        let names = ["A", "B", "C"];

        for a in names {
            for b in names {
                let forward = break_tie(a, b, &history);
                let backward = break_tie(b, a, &history);
                assert_eq!(forward.outcome, backward.outcome.reverse());
            }
        }

        let before = break_tie("A", "B", &history);
        history.reverse();
        assert_eq!(break_tie("A", "B", &history), before);
    }

    #[test]
    fn test_outcome_serializes_as_sign() {
        let value = serde_json::to_value(TieBreak::undecided()).unwrap();
        assert_eq!(value["outcome"], serde_json::json!(0));
        assert_eq!(value["reason"]["kind"], serde_json::json!("undecided"));
    }
}
