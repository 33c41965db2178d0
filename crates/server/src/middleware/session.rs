//! Session middleware configuration.
//!
//! Sessions are stored in `PostgreSQL` with the `postgres` backend and in
//! process memory otherwise. The layer is generic over the store so the
//! cookie settings stay identical.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "tm_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Schema holding the session table, created by migration.
const SESSION_SCHEMA: &str = "tripmate";

/// Session table name.
const SESSION_TABLE: &str = "session";

/// Build the `PostgreSQL` session store.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected.
pub fn postgres_session_store(pool: &PgPool) -> Result<PostgresStore, String> {
    PostgresStore::new(pool.clone())
        .with_schema_name(SESSION_SCHEMA)
        .and_then(|store| store.with_table_name(SESSION_TABLE))
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<S>(store: S, config: &ServerConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
