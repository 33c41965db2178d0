//! Itineraries built by tour guides out of activities.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tripmate_core::{ActivityId, ItineraryId, TagId, UserId};

use super::{Activity, Tag};

/// A stored stop: an activity reference and how long it takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopRef {
    pub activity: ActivityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// A stop with its activity populated.
///
/// `activity` is `None` when the referenced activity no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItineraryStop {
    pub activity_id: ActivityId,
    pub activity: Option<Activity>,
    pub duration: Option<String>,
}

/// An itinerary (domain type) with tags and activities populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub id: ItineraryId,
    pub name: String,
    pub category: Option<String>,
    pub tags: Vec<Tag>,
    pub activities: Vec<ItineraryStop>,
    pub locations: Vec<String>,
    pub timeline: Option<String>,
    pub language: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub available_dates: Vec<NaiveDate>,
    pub accessibility: Option<String>,
    pub pick_up: Option<String>,
    pub drop_off: Option<String>,
    pub created_by: UserId,
    pub flagged: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters of `GET /itineraries`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItineraryFilter {
    pub name: Option<String>,
    pub language: Option<String>,
    /// Upper bound on the base-currency price.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub max_price: Option<Decimal>,
    pub tag: Option<TagId>,
    /// Only itineraries available on this date.
    pub date: Option<NaiveDate>,
    /// Include flagged and inactive itineraries. Never set from the query string.
    #[serde(skip)]
    pub include_hidden: bool,
}

/// Body of `POST /itineraries`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItineraryInput {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub activities: Vec<StopRef>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub available_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub accessibility: Option<String>,
    #[serde(default)]
    pub pick_up: Option<String>,
    #[serde(default)]
    pub drop_off: Option<String>,
}

/// Body of `PUT /itineraries/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItineraryUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<TagId>>,
    pub activities: Option<Vec<StopRef>>,
    pub locations: Option<Vec<String>>,
    pub timeline: Option<String>,
    pub language: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub available_dates: Option<Vec<NaiveDate>>,
    pub accessibility: Option<String>,
    pub pick_up: Option<String>,
    pub drop_off: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_ref_wire_shape() {
        let id = ActivityId::generate();
        let stop: StopRef = serde_json::from_value(serde_json::json!({
            "activity": id.to_string(),
            "duration": "2h",
        }))
        .unwrap();
        assert_eq!(stop.activity, id);
        assert_eq!(stop.duration.as_deref(), Some("2h"));
    }

    #[test]
    fn test_stop_ref_rejects_malformed_activity() {
        let result: Result<StopRef, _> =
            serde_json::from_value(serde_json::json!({"activity": "nope"}));
        assert!(result.is_err());
    }
}
