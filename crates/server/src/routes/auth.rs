//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{ApiJson, Envelope};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Body of `POST /auth/login`. `username` may also be an email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Create an account.
#[instrument(skip(state, registration))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<(StatusCode, Json<Envelope<User>>), AppError> {
    let user = AuthService::new(state.stores().users.as_ref())
        .register(registration)
        .await?;

    let message = if user.accepted {
        "Account created"
    } else {
        "Account created, pending approval"
    };
    Ok((StatusCode::CREATED, Envelope::ok(message, user)))
}

/// Verify credentials and store the user in the session.
#[instrument(skip(state, session, login), fields(username = %login.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(login): ApiJson<LoginRequest>,
) -> Result<Json<Envelope<User>>, AppError> {
    let user = AuthService::new(state.stores().users.as_ref())
        .login(&login.username, &login.password)
        .await?;

    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
        account_type: user.account_type,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, &user.username);

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Envelope::ok("Logged in", user))
}

/// End the session.
pub async fn logout(session: Session) -> Json<Envelope<()>> {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    // Also destroy the entire session
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }
    clear_sentry_user();

    Envelope::ok("Logged out", ())
}
