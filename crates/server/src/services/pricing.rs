//! Price localization.
//!
//! Rewrites the monetary fields of fetched entities into a display currency.
//! Each entity is a fetched copy, so conversions run concurrently across
//! items and across fields without sharing anything. The first failed
//! conversion fails the whole call.

use futures::future::try_join_all;
use rust_decimal::Decimal;

use tripmate_core::CurrencyCode;

use super::currency::{ConversionError, CurrencyConverter};
use crate::models::{Activity, CartEntry, Itinerary, Museum, Product, TicketPrices};

/// Converts entity prices into one display currency.
pub struct Localizer<'a> {
    converter: &'a dyn CurrencyConverter,
    target: CurrencyCode,
}

impl<'a> Localizer<'a> {
    /// Create a localizer converting into `target`.
    #[must_use]
    pub const fn new(converter: &'a dyn CurrencyConverter, target: CurrencyCode) -> Self {
        Self { converter, target }
    }

    /// Convert an optional amount. Absent stays absent.
    async fn amount(&self, amount: Option<Decimal>) -> Result<Option<Decimal>, ConversionError> {
        match amount {
            Some(value) => Ok(Some(self.converter.convert_price(value, self.target).await?)),
            None => Ok(None),
        }
    }

    /// Localize ticket prices, converting the three categories concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn ticket_prices(
        &self,
        prices: TicketPrices,
    ) -> Result<TicketPrices, ConversionError> {
        let (foreigner, native, student) = futures::try_join!(
            self.amount(prices.foreigner),
            self.amount(prices.native),
            self.amount(prices.student),
        )?;
        Ok(TicketPrices {
            foreigner,
            native,
            student,
        })
    }

    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn museum(&self, mut museum: Museum) -> Result<Museum, ConversionError> {
        museum.ticket_prices = self.ticket_prices(museum.ticket_prices).await?;
        Ok(museum)
    }

    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn museums(&self, museums: Vec<Museum>) -> Result<Vec<Museum>, ConversionError> {
        try_join_all(museums.into_iter().map(|m| self.museum(m))).await
    }

    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn product(&self, mut product: Product) -> Result<Product, ConversionError> {
        product.price = self.amount(product.price).await?;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn products(&self, products: Vec<Product>) -> Result<Vec<Product>, ConversionError> {
        try_join_all(products.into_iter().map(|p| self.product(p))).await
    }

    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn activity(&self, mut activity: Activity) -> Result<Activity, ConversionError> {
        activity.price = self.amount(activity.price).await?;
        Ok(activity)
    }

    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn activities(
        &self,
        activities: Vec<Activity>,
    ) -> Result<Vec<Activity>, ConversionError> {
        try_join_all(activities.into_iter().map(|a| self.activity(a))).await
    }

    /// Localize the itinerary price and the prices of its populated stops.
    ///
    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn itinerary(&self, mut itinerary: Itinerary) -> Result<Itinerary, ConversionError> {
        let stops = std::mem::take(&mut itinerary.activities);
        let (price, stops) = futures::try_join!(
            self.amount(itinerary.price),
            try_join_all(stops.into_iter().map(|mut stop| async move {
                if let Some(activity) = stop.activity.take() {
                    stop.activity = Some(self.activity(activity).await?);
                }
                Ok::<_, ConversionError>(stop)
            })),
        )?;
        itinerary.price = price;
        itinerary.activities = stops;
        Ok(itinerary)
    }

    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn itineraries(
        &self,
        itineraries: Vec<Itinerary>,
    ) -> Result<Vec<Itinerary>, ConversionError> {
        try_join_all(itineraries.into_iter().map(|i| self.itinerary(i))).await
    }

    /// Localize cart entries. A product without a price is shown at zero.
    ///
    /// # Errors
    ///
    /// Returns the first `ConversionError` encountered.
    pub async fn cart_entries(
        &self,
        entries: Vec<CartEntry>,
    ) -> Result<Vec<CartEntry>, ConversionError> {
        try_join_all(entries.into_iter().map(|mut entry| async move {
            let price = entry.product.price.unwrap_or(Decimal::ZERO);
            entry.product.price = Some(self.converter.convert_price(price, self.target).await?);
            Ok(entry)
        }))
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use tripmate_core::{MuseumId, ProductId, UserId};

    use super::*;
    use crate::services::currency::FixedRates;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn converter() -> FixedRates {
        FixedRates::new(
            CurrencyCode::EGP,
            HashMap::from([(CurrencyCode::EUR, dec("0.9"))]),
        )
    }

    fn museum(prices: TicketPrices) -> Museum {
        Museum {
            id: MuseumId::generate(),
            name: "Grand Egyptian Museum".to_owned(),
            description: None,
            location: Some("Giza".to_owned()),
            opening_hours: None,
            pictures: vec![],
            ticket_prices: prices,
            tags: vec![],
            created_by: UserId::generate(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(price: Option<Decimal>) -> Product {
        Product {
            id: ProductId::generate(),
            name: "Scarab".to_owned(),
            description: None,
            picture: None,
            price,
            available_quantity: Some(3),
            seller_id: UserId::generate(),
            reviews: vec![],
            average_rating: None,
            archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_museum_absent_category_stays_absent() {
        let converter = converter();
        let localizer = Localizer::new(&converter, CurrencyCode::EUR);

        let stored = museum(TicketPrices {
            foreigner: Some(dec("100")),
            native: Some(dec("50")),
            student: None,
        });
        let shown = localizer.museum(stored.clone()).await.unwrap();

        assert_eq!(shown.ticket_prices.foreigner, Some(dec("90")));
        assert_eq!(shown.ticket_prices.native, Some(dec("45")));
        assert_eq!(shown.ticket_prices.student, None);
        // The stored copy is untouched.
        assert_eq!(stored.ticket_prices.foreigner, Some(dec("100")));

        let json = serde_json::to_value(&shown).unwrap();
        assert!(json["ticket_prices"].get("student").is_none());
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_list() {
        let converter = converter();
        let localizer = Localizer::new(&converter, CurrencyCode::USD);

        let result = localizer
            .museums(vec![
                museum(TicketPrices::default()),
                museum(TicketPrices {
                    foreigner: Some(dec("10")),
                    ..TicketPrices::default()
                }),
            ])
            .await;

        assert!(matches!(
            result,
            Err(ConversionError::UnsupportedCurrency(_))
        ));
    }

    #[tokio::test]
    async fn test_base_currency_leaves_prices_alone() {
        let converter = converter();
        let localizer = Localizer::new(&converter, CurrencyCode::EGP);

        let shown = localizer
            .products(vec![product(Some(dec("12.345"))), product(None)])
            .await
            .unwrap();
        assert_eq!(shown[0].price, Some(dec("12.345")));
        assert_eq!(shown[1].price, None);
    }

    #[tokio::test]
    async fn test_cart_entry_without_price_shows_zero() {
        let converter = converter();
        let localizer = Localizer::new(&converter, CurrencyCode::EUR);

        let entries = localizer
            .cart_entries(vec![
                CartEntry {
                    product: product(None),
                    quantity: 1,
                },
                CartEntry {
                    product: product(Some(dec("20"))),
                    quantity: 2,
                },
            ])
            .await
            .unwrap();

        assert_eq!(entries[0].product.price, Some(Decimal::ZERO));
        assert_eq!(entries[1].product.price, Some(dec("18")));
        assert_eq!(entries[1].quantity, 2);
    }
}
