//! Static exchange rates.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use tripmate_core::CurrencyCode;

use super::{ConversionError, CurrencyConverter};

/// A converter over a fixed rate table, for offline use and tests.
#[derive(Debug, Clone)]
pub struct FixedRates {
    base: CurrencyCode,
    rates: HashMap<CurrencyCode, Decimal>,
}

impl FixedRates {
    /// `rates` maps each target currency to units per one base unit.
    #[must_use]
    pub const fn new(base: CurrencyCode, rates: HashMap<CurrencyCode, Decimal>) -> Self {
        Self { base, rates }
    }
}

#[async_trait]
impl CurrencyConverter for FixedRates {
    fn base_currency(&self) -> CurrencyCode {
        self.base
    }

    async fn rate(&self, target: CurrencyCode) -> Result<Decimal, ConversionError> {
        self.rates
            .get(&target)
            .copied()
            .ok_or(ConversionError::UnsupportedCurrency(target))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn rates() -> FixedRates {
        FixedRates::new(
            CurrencyCode::EGP,
            HashMap::from([(CurrencyCode::EUR, dec("0.9"))]),
        )
    }

    #[tokio::test]
    async fn test_convert_rounds_to_cents() {
        let converted = rates()
            .convert_price(dec("10.555"), CurrencyCode::EUR)
            .await
            .unwrap();
        assert_eq!(converted, dec("9.5"));
    }

    #[tokio::test]
    async fn test_base_currency_is_identity() {
        let amount = dec("123.456");
        let converted = rates()
            .convert_price(amount, CurrencyCode::EGP)
            .await
            .unwrap();
        assert_eq!(converted, amount);
    }

    #[tokio::test]
    async fn test_unknown_currency_is_unsupported() {
        let err = rates()
            .convert_price(dec("1"), CurrencyCode::USD)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedCurrency(c) if c == CurrencyCode::USD));
    }

    #[tokio::test]
    async fn test_conversion_is_repeatable() {
        let converter = rates();
        let first = converter
            .convert_price(dec("100"), CurrencyCode::EUR)
            .await
            .unwrap();
        let second = converter
            .convert_price(dec("100"), CurrencyCode::EUR)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first, dec("90"));
    }
}
