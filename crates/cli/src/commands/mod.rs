//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by commands that talk to the database.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read the database URL the server also uses.
///
/// # Errors
///
/// Returns `CommandError::MissingEnvVar` if neither variable is set.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("TRIPMATE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("TRIPMATE_DATABASE_URL"))
}

/// Connect with the server's pool settings.
///
/// # Errors
///
/// Returns an error if the URL is missing or the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(tripmate_server::db::create_pool(&url).await?)
}
