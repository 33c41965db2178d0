//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TRIPMATE_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; only required with the `postgres` store backend)
//!
//! ## Optional
//! - `STORE_BACKEND` - `postgres` (default) or `memory`
//! - `TRIPMATE_HOST` - Bind address (default: 127.0.0.1)
//! - `TRIPMATE_PORT` - Listen port (default: 8000)
//! - `TRIPMATE_BASE_URL` - Public URL (default: <http://localhost:8000>)
//! - `BASE_CURRENCY` - Currency prices are stored in (default: EGP)
//! - `DEFAULT_DISPLAY_CURRENCY` - Currency used when a request names none
//!   (default: the base currency)
//! - `CURRENCY_PROVIDER` - `http` (default) or `fixed`
//! - `EXCHANGE_RATE_BASE_URL` - Rate API root (default: <https://open.er-api.com/v6>)
//! - `EXCHANGE_RATE_API_KEY` - Rate API key, if the provider needs one
//! - `EXCHANGE_RATE_TTL_SECS` - How long fetched rate tables are reused (default: 300)
//! - `CURRENCY_FIXED_RATES` - `EUR=0.019,USD=0.02` style table for the `fixed` provider
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use tripmate_core::CurrencyCode;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where documents are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// `PostgreSQL` via sqlx.
    Postgres,
    /// Process-local maps. Data is lost on restart.
    Memory,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Persistence backend
    pub store: StoreBackend,
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Currency conversion settings
    pub currency: CurrencyConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Currency conversion settings.
#[derive(Debug, Clone)]
pub struct CurrencyConfig {
    /// Currency all prices are persisted in.
    pub base: CurrencyCode,
    /// Currency used when a request does not name one.
    pub default_display: CurrencyCode,
    /// Where exchange rates come from.
    pub provider: CurrencyProvider,
}

/// Exchange rate source.
#[derive(Debug, Clone)]
pub enum CurrencyProvider {
    /// Fetch rate tables over HTTP.
    Http {
        /// API root, e.g. `https://open.er-api.com/v6`
        base_url: Url,
        /// API key inserted into the path when present
        api_key: Option<SecretString>,
        /// How long a fetched rate table is reused
        ttl: Duration,
    },
    /// A static table: units of target currency per one unit of base currency.
    Fixed(HashMap<CurrencyCode, Decimal>),
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the exchange rate API key fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let store = match env.or_default("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STORE_BACKEND".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        let database_url = env
            .optional("TRIPMATE_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from);
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "TRIPMATE_DATABASE_URL".to_string(),
            ));
        }

        let host = env.parse("TRIPMATE_HOST", "127.0.0.1")?;
        let port = env.parse("TRIPMATE_PORT", "8000")?;
        let base_url = env.or_default("TRIPMATE_BASE_URL", "http://localhost:8000");

        let currency = CurrencyConfig::from_env(&env)?;

        Ok(Self {
            store,
            database_url,
            host,
            port,
            base_url,
            currency,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parse("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CurrencyConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let base: CurrencyCode = env.parse("BASE_CURRENCY", "EGP")?;
        let default_display = match env.optional("DEFAULT_DISPLAY_CURRENCY") {
            Some(code) => code.parse().map_err(|e: tripmate_core::CurrencyError| {
                ConfigError::InvalidEnvVar("DEFAULT_DISPLAY_CURRENCY".to_string(), e.to_string())
            })?,
            None => base,
        };

        let provider = match env.or_default("CURRENCY_PROVIDER", "http").as_str() {
            "http" => {
                let base_url = env.parse("EXCHANGE_RATE_BASE_URL", "https://open.er-api.com/v6")?;
                let api_key = match env.optional("EXCHANGE_RATE_API_KEY") {
                    Some(key) => {
                        validate_secret_strength(&key, "EXCHANGE_RATE_API_KEY")?;
                        Some(SecretString::from(key))
                    }
                    None => None,
                };
                let ttl = Duration::from_secs(env.parse("EXCHANGE_RATE_TTL_SECS", "300")?);
                CurrencyProvider::Http {
                    base_url,
                    api_key,
                    ttl,
                }
            }
            "fixed" => {
                let table = env.or_default("CURRENCY_FIXED_RATES", "");
                CurrencyProvider::Fixed(parse_fixed_rates(&table)?)
            }
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "CURRENCY_PROVIDER".to_string(),
                    format!("expected 'http' or 'fixed', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            base,
            default_display,
            provider,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Thin wrapper over a variable lookup.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional environment variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get an environment variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse an environment variable, falling back to `default`.
    fn parse<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Parse `EUR=0.019,USD=0.02` into a rate table.
fn parse_fixed_rates(table: &str) -> Result<HashMap<CurrencyCode, Decimal>, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("CURRENCY_FIXED_RATES".to_string(), msg);

    table
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (code, rate) = entry
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected CODE=RATE, got '{entry}'")))?;
            let code = CurrencyCode::parse(code).map_err(|e| invalid(e.to_string()))?;
            let rate: Decimal = rate
                .trim()
                .parse()
                .map_err(|e| invalid(format!("rate for {code}: {e}")))?;
            if rate <= Decimal::ZERO {
                return Err(invalid(format!("rate for {code} must be positive")));
            }
            Ok((code, rate))
        })
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let config = load(&[("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.database_url.is_none());
        assert_eq!(config.port, 8000);
        assert_eq!(config.currency.base, CurrencyCode::EGP);
        assert_eq!(config.currency.default_display, CurrencyCode::EGP);
        assert!(matches!(
            config.currency.provider,
            CurrencyProvider::Http { .. }
        ));
    }

    #[test]
    fn test_postgres_backend_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "TRIPMATE_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/tripmate")]).unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://localhost/tripmate"
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("STORE_BACKEND", "memory"), ("TRIPMATE_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref v, _) if v == "TRIPMATE_PORT"));
    }

    #[test]
    fn test_fixed_provider() {
        let config = load(&[
            ("STORE_BACKEND", "memory"),
            ("CURRENCY_PROVIDER", "fixed"),
            ("CURRENCY_FIXED_RATES", "eur=0.019, USD=0.02"),
            ("DEFAULT_DISPLAY_CURRENCY", "usd"),
        ])
        .unwrap();

        assert_eq!(config.currency.default_display, CurrencyCode::USD);
        let CurrencyProvider::Fixed(rates) = config.currency.provider else {
            panic!("expected fixed provider");
        };
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[&CurrencyCode::EUR], "0.019".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_parse_fixed_rates_errors() {
        assert!(parse_fixed_rates("EUR").is_err());
        assert!(parse_fixed_rates("EURO=1").is_err());
        assert!(parse_fixed_rates("EUR=abc").is_err());
        assert!(parse_fixed_rates("EUR=0").is_err());
        assert!(parse_fixed_rates("").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_provider() {
        let err = load(&[("STORE_BACKEND", "memory"), ("CURRENCY_PROVIDER", "carrier-pigeon")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref v, _) if v == "CURRENCY_PROVIDER"));
    }

    #[test]
    fn test_placeholder_api_key_rejected() {
        let err = load(&[
            ("STORE_BACKEND", "memory"),
            ("EXCHANGE_RATE_API_KEY", "your-api-key-here"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("changeme123", "K").is_err());
        assert!(validate_secret_strength(&"a".repeat(33), "K").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "K").is_ok());
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let mut config = load(&[("STORE_BACKEND", "memory"), ("TRIPMATE_PORT", "9100")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9100");
        assert!(!config.is_secure());
        config.base_url = "https://tripmate.example".to_string();
        assert!(config.is_secure());
    }
}
