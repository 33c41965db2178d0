//! Tag route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use tripmate_core::{AccountType, TagId};

use super::{ApiJson, Envelope, parse_id};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{Tag, TagInput};
use crate::state::AppState;

/// List all tags.
pub async fn index(State(state): State<AppState>) -> Result<Json<Envelope<Vec<Tag>>>, AppError> {
    let tags = state.stores().tags.list().await?;
    Ok(Envelope::ok("Tags fetched", tags))
}

/// Create a tag. Admins and tourism governors.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<TagInput>,
) -> Result<(StatusCode, Json<Envelope<Tag>>), AppError> {
    user.require_role(&[AccountType::Admin, AccountType::TourismGovernor])?;
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let tag = state.stores().tags.create(input).await?;
    Ok((StatusCode::CREATED, Envelope::ok("Tag created", tag)))
}

/// Delete a tag. Admin only.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    let id: TagId = parse_id(&id)?;
    user.require_role(&[AccountType::Admin])?;
    state.stores().tags.delete(id).await?;
    Ok(Envelope::ok("Tag deleted", ()))
}
