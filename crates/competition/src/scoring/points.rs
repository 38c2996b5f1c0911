use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// How places turn into points.
///
/// `Linear` awards `competitor_count - place + 1`. `Table` maps a competitor
/// count to the points for places 1, 2, 3, ...; counts without a row fall back
/// to the linear formula.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsTable {
    #[default]
    Linear,
    Table(BTreeMap<usize, Vec<Decimal>>),
}

impl PointsTable {
    /// Builds a table, rejecting rows that are not non-increasing or contain
    /// negative points.
    pub fn from_rows(rows: BTreeMap<usize, Vec<Decimal>>) -> Result<Self, String> {
        let table = Self::Table(rows);
        table.check()?;
        Ok(table)
    }

    pub fn check(&self) -> Result<(), String> {
        let Self::Table(rows) = self else {
            return Ok(());
        };

        for (count, row) in rows {
            if *count == 0 {
                return Err("Points table row for 0 competitors is not allowed".to_string());
            }
            if row.len() < *count {
                return Err(format!(
                    "Points table row for {} competitors has only {} entries",
                    count,
                    row.len()
                ));
            }
            if row.iter().any(|p| p.is_sign_negative()) {
                return Err(format!(
                    "Points table row for {} competitors contains negative points",
                    count
                ));
            }
            if row.windows(2).any(|pair| pair[1] > pair[0]) {
                return Err(format!(
                    "Points table row for {} competitors must not increase with place",
                    count
                ));
            }
        }
        Ok(())
    }

    /// Points for `place` (1-based). Places past the end of the scale earn zero.
    pub fn points_for(&self, competitor_count: usize, place: u32) -> Decimal {
        let place = place.max(1) as usize;
        match self {
            Self::Linear => linear(competitor_count, place),
            Self::Table(rows) => match rows.get(&competitor_count) {
                Some(row) => row.get(place - 1).copied().unwrap_or_default(),
                None => {
                    warn!(
                        "No points table row for {} competitors, using linear points",
                        competitor_count
                    );
                    linear(competitor_count, place)
                }
            },
        }
    }
}

fn linear(competitor_count: usize, place: usize) -> Decimal {
    Decimal::from((competitor_count + 1).saturating_sub(place))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::from(*v)).collect()
    }

    #[test]
    fn test_linear_points() {
        let table = PointsTable::Linear;
        assert_eq!(table.points_for(5, 1), Decimal::from(5));
        assert_eq!(table.points_for(5, 5), Decimal::from(1));
        assert_eq!(table.points_for(5, 7), Decimal::ZERO);
    }

    #[test]
    fn test_table_lookup_and_fallback() {
        let table = PointsTable::from_rows(BTreeMap::from([(3, row(&[10, 6, 3]))])).unwrap();
        assert_eq!(table.points_for(3, 2), Decimal::from(6));
        assert_eq!(table.points_for(3, 4), Decimal::ZERO);
        assert_eq!(table.points_for(4, 1), Decimal::from(4));
    }

    #[test]
    fn test_rows_must_not_increase() {
        assert!(PointsTable::from_rows(BTreeMap::from([(3, row(&[3, 4, 1]))])).is_err());
        assert!(PointsTable::from_rows(BTreeMap::from([(3, row(&[3, 2]))])).is_err());
        assert!(PointsTable::from_rows(BTreeMap::from([(2, row(&[1, -1]))])).is_err());
    }

    #[test]
    fn test_deserialize_from_config() {
        let linear: PointsTable = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(linear, PointsTable::Linear);

        let table: PointsTable =
            serde_json::from_str(r#"{"table": {"2": [2, 1], "3": [3.5, 2, 1]}}"#).unwrap();
        assert!(table.check().is_ok());
        assert_eq!(table.points_for(3, 1), Decimal::new(35, 1));
    }
}
