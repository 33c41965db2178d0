//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error renders as `{"message": "..."}` with a status that reflects
//! the failure class.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use tripmate_core::{CurrencyError, IdError};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::currency::ConversionError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Price conversion failed.
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Malformed or rule-breaking input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IdError> for AppError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CurrencyError> for AppError {
    fn from(err: CurrencyError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => repository_status(err),
            Self::Cart(err) => match err {
                CartError::ProductNotFound | CartError::UserNotFound | CartError::LineNotFound => {
                    StatusCode::NOT_FOUND
                }
                CartError::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
                CartError::Repository(err) => repository_status(err),
                CartError::Conversion(err) => conversion_status(err),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::NotAccepted | AuthError::RoleNotAllowed(_) => StatusCode::FORBIDDEN,
                AuthError::UserAlreadyExists(_) => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Conversion(err) => conversion_status(err),
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client.
    fn public_message(&self) -> String {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            return "Internal server error".to_string();
        }

        match self {
            Self::Database(RepositoryError::NotFound) => "Resource not found".to_string(),
            Self::Database(RepositoryError::Conflict(what)) => format!("{what} already exists"),
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Cart(CartError::Conversion(err)) | Self::Conversion(err) => err.to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

const fn conversion_status(err: &ConversionError) -> StatusCode {
    match err {
        ConversionError::UnsupportedCurrency(_) => StatusCode::BAD_REQUEST,
        ConversionError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = Json(json!({ "message": self.public_message() }));
        (status, body).into_response()
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "64b7...")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::body::to_bytes;
    use tripmate_core::{CurrencyCode, ProductId};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn get_body(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("museum".to_string());
        assert_eq!(err.to_string(), "Not found: museum");

        let err = AppError::Validation("invalid input".to_string());
        assert_eq!(err.to_string(), "Validation error: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("username".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                CartError::InvalidQuantity {
                    requested: 5,
                    available: 3
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CartError::ProductNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ConversionError::Upstream("down".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(ConversionError::UnsupportedCurrency(CurrencyCode::USD).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_malformed_id_is_validation_error() {
        let err: AppError = "nope".parse::<ProductId>().unwrap_err().into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_body_is_message_only() {
        let body = get_body(
            CartError::InvalidQuantity {
                requested: 5,
                available: 3,
            }
            .into(),
        )
        .await;
        let object = body.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(
            object["message"]
                .as_str()
                .unwrap()
                .contains("not available")
        );
    }

    #[tokio::test]
    async fn test_server_error_details_hidden() {
        let body = get_body(RepositoryError::DataCorruption("bad row 42".to_string()).into()).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
