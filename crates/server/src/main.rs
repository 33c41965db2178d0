//! Tripmate API server.
//!
//! Serves the REST API on port 8000 by default.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - `PostgreSQL` (or an in-process store) for all documents
//! - tower-sessions for login state
//! - An exchange-rate API for display prices

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sentry::integrations::tracing as sentry_tracing;
use tower_sessions::ExpiredDeletion;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tripmate_server::build_app;
use tripmate_server::config::{ServerConfig, StoreBackend};
use tripmate_server::db::{self, MemoryStore, Stores};
use tripmate_server::middleware::postgres_session_store;
use tripmate_server::state::AppState;

/// How often expired sessions are purged from `PostgreSQL`.
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tripmate_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let addr = config.socket_addr();

    let app = match config.store {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .clone()
                .expect("database URL is validated for the postgres backend");
            let pool = db::create_pool(&database_url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");

            // NOTE: Migrations are NOT run automatically on startup.
            // Run them explicitly via: cargo run -p tripmate-cli -- migrate

            let session_store =
                postgres_session_store(&pool).expect("Invalid session table configuration");
            tokio::task::spawn(
                session_store
                    .clone()
                    .continuously_delete_expired(SESSION_CLEANUP_INTERVAL),
            );

            let state = AppState::new(config, Stores::postgres(pool))
                .expect("Failed to build currency converter");
            build_app(state, session_store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            let stores = Stores::in_memory(Arc::new(MemoryStore::new()));
            let state =
                AppState::new(config, stores).expect("Failed to build currency converter");
            build_app(state, tower_sessions::MemoryStore::default())
        }
    };

    serve(app, addr).await;
}

async fn serve(app: Router, addr: std::net::SocketAddr) {
    tracing::info!("tripmate-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
