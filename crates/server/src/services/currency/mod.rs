//! Currency conversion for display prices.
//!
//! Prices are persisted in the base currency and converted on read only.
//! A converter never mutates the amount it is given.

mod fixed;
mod http;

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use tripmate_core::{CurrencyCode, round_money};

use crate::config::{CurrencyConfig, CurrencyProvider};

pub use fixed::FixedRates;
pub use http::ExchangeRateClient;

/// Errors that can occur while converting a price.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    /// No rate is known for the requested currency.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(CurrencyCode),

    /// The rate source could not be reached or returned garbage.
    #[error("exchange rate service unavailable: {0}")]
    Upstream(String),
}

/// Converts base-currency amounts into a display currency.
#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    /// Currency that stored prices are in.
    fn base_currency(&self) -> CurrencyCode;

    /// Units of `target` per one unit of base currency.
    async fn rate(&self, target: CurrencyCode) -> Result<Decimal, ConversionError>;

    /// Convert `amount` from the base currency into `target`.
    ///
    /// Converting into the base currency returns `amount` untouched without
    /// consulting the rate source. Other results are rounded to cents.
    async fn convert_price(
        &self,
        amount: Decimal,
        target: CurrencyCode,
    ) -> Result<Decimal, ConversionError> {
        if target == self.base_currency() {
            return Ok(amount);
        }
        let rate = self.rate(target).await?;
        Ok(round_money(amount * rate))
    }
}

/// Build the converter selected by configuration.
///
/// # Errors
///
/// Returns `ConversionError::Upstream` if the HTTP client cannot be built.
pub fn from_config(
    config: &CurrencyConfig,
) -> Result<Arc<dyn CurrencyConverter>, ConversionError> {
    Ok(match &config.provider {
        CurrencyProvider::Http {
            base_url,
            api_key,
            ttl,
        } => Arc::new(ExchangeRateClient::new(
            config.base,
            base_url.clone(),
            api_key.clone(),
            *ttl,
        )?),
        CurrencyProvider::Fixed(rates) => Arc::new(FixedRates::new(config.base, rates.clone())),
    })
}
