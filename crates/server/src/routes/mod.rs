//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (store ping)
//!
//! # Auth
//! POST   /auth/register               - Create an account
//! POST   /auth/login                  - Start a session
//! POST   /auth/logout                 - End the session
//!
//! # Users
//! GET    /users/me                    - Own profile
//! PUT    /users/me                    - Update own profile / password
//! GET    /users                       - List users (admin)
//! GET    /users/{id}                  - Show user (admin)
//! PATCH  /users/{id}/accept           - Accept a pending account (admin)
//! DELETE /users/{id}                  - Delete user (admin)
//!
//! # Catalogue (prices localized to the display currency)
//! GET    /products[/mine|/{id}]       POST /products         PUT|DELETE /products/{id}
//! POST   /products/{id}/reviews
//! GET    /museums[/mine|/tags|/{id}]  POST /museums          PUT|DELETE /museums/{id}
//! GET    /activities[/mine|/{id}]     POST /activities       PUT|DELETE /activities/{id}
//! PATCH  /activities/{id}/flag
//! GET    /itineraries[/mine|/{id}]    POST /itineraries      PUT|DELETE /itineraries/{id}
//! PATCH  /itineraries/{id}/flag       PATCH /itineraries/{id}/active
//! GET    /tags                        POST /tags             DELETE /tags/{id}
//!
//! # Cart (tourists)
//! GET    /cart                        - Cart with localized prices
//! POST   /cart                        - Add or replace a line
//! DELETE /cart/{product_id}           - Remove a line
//! ```

pub mod activities;
pub mod auth;
pub mod cart;
pub mod health;
pub mod itineraries;
pub mod museums;
pub mod products;
pub mod tags;
pub mod users;

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts},
    routing::{delete, get, patch, post},
};
use serde::Serialize;

use tripmate_core::{CurrencyCode, IdError};

use crate::error::AppError;
use crate::state::AppState;

// =============================================================================
// Envelopes and Extractors
// =============================================================================

/// Success body: `{message, [currency], data}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    /// Plain envelope.
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            message: message.into(),
            currency: None,
            data,
        })
    }

    /// Envelope for prices shown in `currency`.
    pub fn localized(message: impl Into<String>, currency: CurrencyCode, data: T) -> Json<Self> {
        Json(Self {
            message: message.into(),
            currency: Some(currency),
            data,
        })
    }
}

/// Cart body: `{message, [currency], cart}`.
#[derive(Debug, Serialize)]
pub struct CartEnvelope<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    pub cart: T,
}

/// JSON body extractor whose rejection uses the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejection uses the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Parse a path identifier.
///
/// Handlers call this before touching any store, so a malformed id never
/// reaches the database.
///
/// # Errors
///
/// Returns `AppError::Validation` for anything but 24 hex characters.
pub fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr<Err = IdError>,
{
    Ok(raw.parse()?)
}

/// Turn a missing record into a 404 naming `what`.
pub(crate) fn found<T>(record: Option<T>, what: &str) -> Result<T, AppError> {
    record.ok_or_else(|| AppError::NotFound(format!("{what} not found")))
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/me", get(users::me).put(users::update_me))
        .route("/{id}", get(users::show).delete(users::destroy))
        .route("/{id}/accept", patch(users::accept))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/mine", get(products::mine))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/{id}/reviews", post(products::review))
}

/// Create the museum routes router.
pub fn museum_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(museums::index).post(museums::create))
        .route("/mine", get(museums::mine))
        .route("/tags", get(museums::by_tags))
        .route(
            "/{id}",
            get(museums::show)
                .put(museums::update)
                .delete(museums::destroy),
        )
}

/// Create the activity routes router.
pub fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(activities::index).post(activities::create))
        .route("/mine", get(activities::mine))
        .route(
            "/{id}",
            get(activities::show)
                .put(activities::update)
                .delete(activities::destroy),
        )
        .route("/{id}/flag", patch(activities::flag))
}

/// Create the itinerary routes router.
pub fn itinerary_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(itineraries::index).post(itineraries::create))
        .route("/mine", get(itineraries::mine))
        .route(
            "/{id}",
            get(itineraries::show)
                .put(itineraries::update)
                .delete(itineraries::destroy),
        )
        .route("/{id}/flag", patch(itineraries::flag))
        .route("/{id}/active", patch(itineraries::set_active))
}

/// Create the tag routes router.
pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::index).post(tags::create))
        .route("/{id}", delete(tags::destroy))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{product_id}", delete(cart::remove))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/museums", museum_routes())
        .nest("/activities", activity_routes())
        .nest("/itineraries", itinerary_routes())
        .nest("/tags", tag_routes())
        .nest("/cart", cart_routes())
}

#[cfg(test)]
mod tests {
    use tripmate_core::MuseumId;

    use super::*;

    #[test]
    fn test_parse_id() {
        assert!(parse_id::<MuseumId>("507f1f77bcf86cd799439011").is_ok());
        assert!(matches!(
            parse_id::<MuseumId>("507f1f77"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_envelope_shape() {
        let Json(body) = Envelope::localized("Museums fetched", CurrencyCode::EUR, vec![1, 2]);
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json["currency"], "EUR");
        assert_eq!(json["data"], serde_json::json!([1, 2]));

        let Json(body) = Envelope::ok("Tag created", ());
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert!(json.get("currency").is_none());
    }
}
