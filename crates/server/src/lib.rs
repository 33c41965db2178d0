//! Tripmate API server library.
//!
//! This crate provides the REST API as a library, allowing it to be tested
//! in-process and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use state::AppState;

/// Build the full application router.
///
/// Sessions live in `session_store`; the caller picks `PostgreSQL` or memory
/// to match the entity store backend.
pub fn build_app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(session_store, state.config());

    Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServerConfig;
    use crate::db::{MemoryStore, Stores};
    use crate::middleware::request_id::REQUEST_ID_HEADER;

    fn app() -> Router {
        let config = ServerConfig::from_lookup(|key| match key {
            "STORE_BACKEND" => Some("memory".to_string()),
            "CURRENCY_PROVIDER" => Some("fixed".to_string()),
            _ => None,
        })
        .unwrap();
        let state =
            AppState::new(config, Stores::in_memory(Arc::new(MemoryStore::new()))).unwrap();
        build_app(state, tower_sessions::MemoryStore::default())
    }

    fn get(uri: &str) -> axum::http::request::Builder {
        Request::builder().uri(uri)
    }

    #[tokio::test]
    async fn test_request_id_echoed() {
        let response = app()
            .oneshot(
                get("/health")
                    .header(REQUEST_ID_HEADER, "probe-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "probe-42");
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let response = app()
            .oneshot(get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert_eq!(id.len(), 36);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(get("/shop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
