//! Display currency resolution.
//!
//! The currency a response is priced in comes from, in order: the
//! `currency` query parameter, the `x-currency` header, the configured
//! default.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use tripmate_core::CurrencyCode;

use crate::error::AppError;
use crate::state::AppState;

/// Header naming the display currency.
pub const CURRENCY_HEADER: &str = "x-currency";

#[derive(Deserialize)]
struct CurrencyQuery {
    currency: Option<String>,
}

/// Extractor for the currency prices should be shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayCurrency(pub CurrencyCode);

fn requested(parts: &Parts) -> Result<Option<String>, AppError> {
    let query = Query::<CurrencyQuery>::try_from_uri(&parts.uri)
        .map_err(|e| AppError::Validation(e.body_text()))?;
    if let Some(code) = query.0.currency {
        return Ok(Some(code));
    }

    parts
        .headers
        .get(CURRENCY_HEADER)
        .map(|value| {
            value
                .to_str()
                .map(str::to_owned)
                .map_err(|_| AppError::Validation(format!("{CURRENCY_HEADER} is not text")))
        })
        .transpose()
}

impl FromRequestParts<AppState> for DisplayCurrency {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match requested(parts)? {
            Some(code) => Ok(Self(CurrencyCode::parse(&code)?)),
            None => Ok(Self(state.config().currency.default_display)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(uri: &str, header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = header {
            builder = builder.header(CURRENCY_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_query_wins_over_header() {
        let p = parts("/museums?currency=eur", Some("USD"));
        assert_eq!(requested(&p).unwrap().as_deref(), Some("eur"));
    }

    #[test]
    fn test_header_used_without_query() {
        let p = parts("/museums?name=x", Some("USD"));
        assert_eq!(requested(&p).unwrap().as_deref(), Some("USD"));
    }

    #[test]
    fn test_nothing_requested() {
        let p = parts("/museums", None);
        assert_eq!(requested(&p).unwrap(), None);
    }
}
