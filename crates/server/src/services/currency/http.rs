//! Exchange rates fetched over HTTP.
//!
//! Talks to an open exchange-rate API:
//!
//! - `GET {base_url}/latest/{BASE}` without a key
//! - `GET {base_url}/{key}/latest/{BASE}` with one
//!
//! Both answer `{"result": "success", "rates": {"EUR": 0.019, ...}}`.
//! The whole table is cached per base currency.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use tripmate_core::CurrencyCode;

use super::{ConversionError, CurrencyConverter};

type RateTable = Arc<HashMap<CurrencyCode, Decimal>>;

/// Upper bound on one rate request, connect included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on establishing the connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct LatestRates {
    result: String,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
}

/// Client for an exchange-rate API with a TTL cache.
#[derive(Clone)]
pub struct ExchangeRateClient {
    inner: Arc<ExchangeRateClientInner>,
}

struct ExchangeRateClientInner {
    client: reqwest::Client,
    base: CurrencyCode,
    base_url: Url,
    api_key: Option<SecretString>,
    cache: Cache<CurrencyCode, RateTable>,
}

impl ExchangeRateClient {
    /// Create a client for rates relative to `base`.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::Upstream` if the HTTP client cannot be built.
    pub fn new(
        base: CurrencyCode,
        base_url: Url,
        api_key: Option<SecretString>,
        ttl: Duration,
    ) -> Result<Self, ConversionError> {
        Self::with_timeout(base, base_url, api_key, ttl, REQUEST_TIMEOUT)
    }

    fn with_timeout(
        base: CurrencyCode,
        base_url: Url,
        api_key: Option<SecretString>,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Self, ConversionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| ConversionError::Upstream(format!("HTTP client: {e}")))?;
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();

        Ok(Self {
            inner: Arc::new(ExchangeRateClientInner {
                client,
                base,
                base_url,
                api_key,
                cache,
            }),
        })
    }

    fn latest_url(&self) -> String {
        let root = self.inner.base_url.as_str().trim_end_matches('/');
        match &self.inner.api_key {
            Some(key) => format!("{root}/{}/latest/{}", key.expose_secret(), self.inner.base),
            None => format!("{root}/latest/{}", self.inner.base),
        }
    }

    /// The current rate table, from cache or upstream.
    async fn table(&self) -> Result<RateTable, ConversionError> {
        self.inner
            .cache
            .try_get_with(self.inner.base, self.fetch_table())
            .await
            .map_err(|e| (*e).clone())
    }

    #[instrument(skip(self), fields(base = %self.inner.base))]
    async fn fetch_table(&self) -> Result<RateTable, ConversionError> {
        let upstream = |e: reqwest::Error| ConversionError::Upstream(e.without_url().to_string());

        let response = self
            .inner
            .client
            .get(self.latest_url())
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Exchange rate API returned non-success status");
            return Err(ConversionError::Upstream(format!("HTTP {status}")));
        }

        let body: LatestRates = response.json().await.map_err(upstream)?;
        if body.result != "success" {
            return Err(ConversionError::Upstream(format!(
                "rate lookup failed: {}",
                body.error_type.as_deref().unwrap_or("unknown error")
            )));
        }

        let table: HashMap<CurrencyCode, Decimal> = body
            .rates
            .into_iter()
            .filter_map(|(code, rate)| CurrencyCode::parse(&code).ok().map(|c| (c, rate)))
            .collect();
        debug!(currencies = table.len(), "Fetched exchange rates");

        Ok(Arc::new(table))
    }
}

#[async_trait]
impl CurrencyConverter for ExchangeRateClient {
    fn base_currency(&self) -> CurrencyCode {
        self.inner.base
    }

    async fn rate(&self, target: CurrencyCode) -> Result<Decimal, ConversionError> {
        let table = self.table().await?;
        table
            .get(&target)
            .copied()
            .ok_or(ConversionError::UnsupportedCurrency(target))
    }
}
