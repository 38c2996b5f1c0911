use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use super::serde_helpers::{blank_as_none, blank_string_as_none};

/// Roster entry. Competition state refers to competitors by `name` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    #[validate(custom(function = "validate_trimmed"))]
    pub name: String,

    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,

    /// Height in centimetres.
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub height: Option<Decimal>,

    /// Body weight in kilograms.
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,

    #[validate(length(max = 255))]
    #[serde(default, deserialize_with = "blank_string_as_none", skip_serializing_if = "Option::is_none")]
    pub residence: Option<String>,

    #[serde(default, deserialize_with = "blank_string_as_none", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Photo as a data URL.
    #[serde(default, deserialize_with = "blank_string_as_none", skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,

    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl Competitor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            birth_date: None,
            height: None,
            weight: None,
            residence: None,
            notes: None,
            photo: None,
            categories: BTreeSet::new(),
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }
}

fn validate_trimmed(name: &str) -> Result<(), validator::ValidationError> {
    if name.trim() == name {
        Ok(())
    } else {
        Err(validator::ValidationError::new("untrimmed_name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_form_fields_become_none() {
        let json = r#"{
            "id": 4,
            "name": "Mariusz",
            "birthDate": "",
            "height": "186",
            "weight": 130.5,
            "residence": "  ",
            "notes": "",
            "categories": ["open", "masters"]
        }"#;
        let competitor: Competitor = serde_json::from_str(json).unwrap();

        assert_eq!(competitor.id, Some(4));
        assert_eq!(competitor.birth_date, None);
        assert_eq!(competitor.height, Some(Decimal::from(186)));
        assert_eq!(competitor.weight, Some(Decimal::new(1305, 1)));
        assert_eq!(competitor.residence, None);
        assert!(competitor.in_category("masters"));
    }

    #[test]
    fn test_birth_date_parsing() {
        let json = r#"{"name": "Ola", "birthDate": "1994-05-17"}"#;
        let competitor: Competitor = serde_json::from_str(json).unwrap();
        assert_eq!(competitor.birth_date, NaiveDate::from_ymd_opt(1994, 5, 17));
    }

    #[test]
    fn test_name_validation() {
        assert!(Competitor::new("Jan").validate().is_ok());
        assert!(Competitor::new("").validate().is_err());
        assert!(Competitor::new(" Jan").validate().is_err());
        assert!(Competitor::new("x".repeat(256)).validate().is_err());
    }
}
