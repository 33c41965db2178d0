//! Products sold by sellers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tripmate_core::{ProductId, UserId};

/// A review left by a tourist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub user: UserId,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A product (domain type).
///
/// `price` is in base currency; `available_quantity` is the stock counter
/// checked (never decremented) by the cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub picture: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub available_quantity: Option<u32>,
    pub seller_id: UserId,
    pub reviews: Vec<Review>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub average_rating: Option<Decimal>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Stock available to the cart; unset counts as none.
    #[must_use]
    pub fn stock(&self) -> u32 {
        self.available_quantity.unwrap_or(0)
    }

    /// Mean of all review ratings, to two decimal places.
    #[must_use]
    pub fn rating_average(reviews: &[Review]) -> Option<Decimal> {
        if reviews.is_empty() {
            return None;
        }
        let sum: Decimal = reviews.iter().map(|r| Decimal::from(r.rating)).sum();
        Some(tripmate_core::round_money(sum / Decimal::from(reviews.len())))
    }
}

/// Query parameters of `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    pub seller: Option<UserId>,
}

/// Body of `POST /products`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub available_quantity: Option<u32>,
}

/// Body of `PUT /products/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub picture: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub available_quantity: Option<u32>,
    pub archived: Option<bool>,
}

impl ProductUpdate {
    /// Apply the present fields onto `product`.
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(picture) = self.picture {
            product.picture = Some(picture);
        }
        if let Some(price) = self.price {
            product.price = Some(price);
        }
        if let Some(quantity) = self.available_quantity {
            product.available_quantity = Some(quantity);
        }
        if let Some(archived) = self.archived {
            product.archived = archived;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            user: UserId::generate(),
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rating_average() {
        assert_eq!(Product::rating_average(&[]), None);
        assert_eq!(
            Product::rating_average(&[review(5), review(4), review(4)]),
            Some("4.33".parse().unwrap())
        );
    }

    #[test]
    fn test_input_price_and_stock_are_optional() {
        let input: ProductInput = serde_json::from_str(r#"{"name": "Papyrus"}"#).unwrap();
        assert_eq!(input.price, None);
        assert_eq!(input.available_quantity, None);
    }
}
