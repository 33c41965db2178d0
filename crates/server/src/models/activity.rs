//! Activities published by advertisers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tripmate_core::{ActivityId, TagId, UserId};

use super::Tag;

/// An activity (domain type) with its tags populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub tags: Vec<Tag>,
    pub special_discounts: Option<String>,
    pub booking_open: bool,
    pub created_by: UserId,
    pub flagged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters of `GET /activities`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    pub category: Option<String>,
    /// Include flagged activities. Never set from the query string.
    #[serde(skip)]
    pub include_flagged: bool,
}

/// Body of `POST /activities`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub special_discounts: Option<String>,
    #[serde(default = "default_booking_open")]
    pub booking_open: bool,
}

const fn default_booking_open() -> bool {
    true
}

/// Body of `PUT /activities/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub tags: Option<Vec<TagId>>,
    pub special_discounts: Option<String>,
    pub booking_open: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults() {
        let input: ActivityInput =
            serde_json::from_str(r#"{"name": "Felucca ride", "price": 150.5}"#).unwrap();
        assert!(input.booking_open);
        assert!(input.tags.is_empty());
        assert_eq!(input.price, Some("150.5".parse().unwrap()));
    }

    #[test]
    fn test_filter_cannot_reveal_flagged_from_query() {
        let filter: ActivityFilter =
            serde_json::from_str(r#"{"category": "boat", "include_flagged": true}"#).unwrap();
        assert!(!filter.include_flagged);
        assert_eq!(filter.category.as_deref(), Some("boat"));
    }
}
