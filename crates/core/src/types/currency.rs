//! Currency codes and money rounding.
//!
//! Prices are persisted in a single base currency and converted at read time.
//! The code attached to a converted amount is a [`CurrencyCode`].

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places kept on converted amounts.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Error returned when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid currency code {0:?}: expected three letters")]
pub struct CurrencyError(pub String);

/// An ISO 4217-style currency code (three uppercase ASCII letters).
///
/// Parsing trims and upper-cases its input, so `"eur"` and `" EUR "` are both
/// accepted. Whether a rate exists for the code is the converter's concern.
///
/// ```
/// use tripmate_core::CurrencyCode;
///
/// let eur: CurrencyCode = "eur".parse().unwrap();
/// assert_eq!(eur.as_str(), "EUR");
/// assert!("EURO".parse::<CurrencyCode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Egyptian pound, the default base currency.
    pub const EGP: Self = Self(*b"EGP");
    /// Euro.
    pub const EUR: Self = Self(*b"EUR");
    /// US dollar.
    pub const USD: Self = Self(*b"USD");

    /// Parse a currency code.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError` unless the trimmed input is exactly three ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CurrencyError> {
        let trimmed = s.trim();
        match trimmed.as_bytes() {
            [a, b, c] if trimmed.bytes().all(|ch| ch.is_ascii_alphabetic()) => Ok(Self([
                a.to_ascii_uppercase(),
                b.to_ascii_uppercase(),
                c.to_ascii_uppercase(),
            ])),
            _ => Err(CurrencyError(s.to_owned())),
        }
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        core::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_owned()
    }
}

/// Round a monetary amount to two decimal places, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount
        .round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_uppercases() {
        assert_eq!(CurrencyCode::parse("usd").unwrap(), CurrencyCode::USD);
        assert_eq!(CurrencyCode::parse(" Egp ").unwrap(), CurrencyCode::EGP);
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        assert!(CurrencyCode::parse("").is_err());
        assert!(CurrencyCode::parse("EU").is_err());
        assert!(CurrencyCode::parse("EURO").is_err());
        assert!(CurrencyCode::parse("E1R").is_err());
        assert!(CurrencyCode::parse("€UR").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&CurrencyCode::EUR).unwrap();
        assert_eq!(json, "\"EUR\"");
        let back: CurrencyCode = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(back.as_str(), "GBP");
        assert!(serde_json::from_str::<CurrencyCode>("\"pounds\"").is_err());
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(dec("90.000")), dec("90"));
        assert_eq!(round_money(dec("1.005")), dec("1.01"));
        assert_eq!(round_money(dec("-1.005")), dec("-1.01"));
        assert_eq!(round_money(dec("19.994")), dec("19.99"));
    }
}
