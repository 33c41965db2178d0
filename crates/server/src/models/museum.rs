//! Museums and historical places.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tripmate_core::{MuseumId, TagId, UserId};

/// Ticket prices per visitor category, in base currency when stored.
///
/// An absent category stays absent through localization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPrices {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub foreigner: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub native: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub student: Option<Decimal>,
}

/// A museum (domain type).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Museum {
    pub id: MuseumId,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub opening_hours: Option<String>,
    pub pictures: Vec<String>,
    pub ticket_prices: TicketPrices,
    pub tags: Vec<TagId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /museums`.
#[derive(Debug, Clone, Deserialize)]
pub struct MuseumInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub pictures: Vec<String>,
    #[serde(default)]
    pub ticket_prices: TicketPrices,
    #[serde(default)]
    pub tags: Vec<TagId>,
}

/// Body of `PUT /museums/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MuseumUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub opening_hours: Option<String>,
    pub pictures: Option<Vec<String>>,
    pub ticket_prices: Option<TicketPrices>,
    pub tags: Option<Vec<TagId>>,
}

impl MuseumUpdate {
    /// Apply the present fields onto `museum`.
    pub fn apply(self, museum: &mut Museum) {
        if let Some(name) = self.name {
            museum.name = name;
        }
        if let Some(description) = self.description {
            museum.description = Some(description);
        }
        if let Some(location) = self.location {
            museum.location = Some(location);
        }
        if let Some(hours) = self.opening_hours {
            museum.opening_hours = Some(hours);
        }
        if let Some(pictures) = self.pictures {
            museum.pictures = pictures;
        }
        if let Some(prices) = self.ticket_prices {
            museum.ticket_prices = prices;
        }
        if let Some(tags) = self.tags {
            museum.tags = tags;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_prices_absent_fields_stay_absent() {
        let prices: TicketPrices =
            serde_json::from_str(r#"{"foreigner": 100, "native": 50}"#).unwrap();
        assert_eq!(prices.foreigner, Some(Decimal::from(100)));
        assert_eq!(prices.student, None);

        let json = serde_json::to_value(prices).unwrap();
        assert!(json.get("student").is_none());
        assert_eq!(json["native"].as_f64(), Some(50.0));
    }

    #[test]
    fn test_update_keeps_missing_fields() {
        let mut museum = Museum {
            id: MuseumId::generate(),
            name: "Egyptian Museum".to_string(),
            description: None,
            location: Some("Tahrir".to_string()),
            opening_hours: None,
            pictures: vec![],
            ticket_prices: TicketPrices::default(),
            tags: vec![],
            created_by: UserId::generate(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        MuseumUpdate {
            opening_hours: Some("9-17".to_string()),
            ..MuseumUpdate::default()
        }
        .apply(&mut museum);

        assert_eq!(museum.location.as_deref(), Some("Tahrir"));
        assert_eq!(museum.opening_hours.as_deref(), Some("9-17"));
    }
}
