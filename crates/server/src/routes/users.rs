//! User route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use tripmate_core::{AccountType, UserId};

use super::{ApiJson, ApiQuery, Envelope, found, parse_id};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{AccountUpdate, AuthService};
use crate::state::AppState;

/// Query for `GET /users`.
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub account_type: Option<AccountType>,
}

/// Show the caller's own profile.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Envelope<User>>, AppError> {
    let profile = found(state.stores().users.get(user.id).await?, "User")?;
    Ok(Envelope::ok("Profile fetched", profile))
}

/// Update the caller's own profile, email or password.
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(update): ApiJson<AccountUpdate>,
) -> Result<Json<Envelope<User>>, AppError> {
    let users = state.stores().users.as_ref();
    let existing = found(users.get(user.id).await?, "User")?;
    let updated = AuthService::new(users)
        .update_account(&existing, update)
        .await?;
    Ok(Envelope::ok("Profile updated", updated))
}

/// List users, optionally by role. Admin only.
#[instrument(skip(state, user, query))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Envelope<Vec<User>>>, AppError> {
    user.require_role(&[AccountType::Admin])?;
    let users = state.stores().users.list(query.account_type).await?;
    Ok(Envelope::ok("Users fetched", users))
}

/// Show one user. Admin only.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Envelope<User>>, AppError> {
    let id: UserId = parse_id(&id)?;
    user.require_role(&[AccountType::Admin])?;
    let shown = found(state.stores().users.get(id).await?, "User")?;
    Ok(Envelope::ok("User fetched", shown))
}

/// Accept a pending account. Admin only.
#[instrument(skip(state, user))]
pub async fn accept(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Envelope<User>>, AppError> {
    let id: UserId = parse_id(&id)?;
    user.require_role(&[AccountType::Admin])?;
    let accepted = state.stores().users.set_accepted(id, true).await?;
    tracing::info!(user_id = %id, "User accepted");
    Ok(Envelope::ok("User accepted", accepted))
}

/// Delete a user. Admin only.
#[instrument(skip(state, user))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    let id: UserId = parse_id(&id)?;
    user.require_role(&[AccountType::Admin])?;
    state.stores().users.delete(id).await?;
    Ok(Envelope::ok("User deleted", ()))
}
