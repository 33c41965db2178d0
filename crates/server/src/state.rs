//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Stores;
use crate::services::currency::{self, ConversionError, CurrencyConverter};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the entity stores, the price converter and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    stores: Stores,
    converter: Arc<dyn CurrencyConverter>,
}

impl AppState {
    /// Create application state with the converter selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate client cannot be built.
    pub fn new(config: ServerConfig, stores: Stores) -> Result<Self, ConversionError> {
        let converter = currency::from_config(&config.currency)?;
        Ok(Self::with_converter(config, stores, converter))
    }

    /// Create application state with an explicit converter.
    #[must_use]
    pub fn with_converter(
        config: ServerConfig,
        stores: Stores,
        converter: Arc<dyn CurrencyConverter>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                converter,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the entity stores.
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    /// Get the price converter.
    #[must_use]
    pub fn converter(&self) -> &dyn CurrencyConverter {
        self.inner.converter.as_ref()
    }
}
