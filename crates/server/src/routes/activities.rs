//! Activity route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use tripmate_core::{AccountType, ActivityId};

use super::{ApiJson, ApiQuery, Envelope, found, parse_id};
use crate::error::AppError;
use crate::middleware::{DisplayCurrency, OptionalAuth, RequireAuth};
use crate::models::{Activity, ActivityFilter, ActivityInput, ActivityUpdate};
use crate::services::pricing::Localizer;
use crate::state::AppState;

/// Roles that publish activities.
const ADVERTISERS: &[AccountType] = &[AccountType::Advertiser, AccountType::Admin];

/// Body of `PATCH /activities/{id}/flag` and `PATCH /itineraries/{id}/flag`.
#[derive(Debug, Deserialize)]
pub struct FlagInput {
    pub flagged: bool,
}

/// List unflagged activities.
#[instrument(skip(state, filter), fields(currency = %currency))]
pub async fn index(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
    ApiQuery(filter): ApiQuery<ActivityFilter>,
) -> Result<Json<Envelope<Vec<Activity>>>, AppError> {
    let activities = state.stores().activities.list(&filter).await?;
    let activities = Localizer::new(state.converter(), currency)
        .activities(activities)
        .await?;
    Ok(Envelope::localized("Activities fetched", currency, activities))
}

/// List the caller's activities, flagged ones included.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    DisplayCurrency(currency): DisplayCurrency,
) -> Result<Json<Envelope<Vec<Activity>>>, AppError> {
    user.require_role(ADVERTISERS)?;
    let activities = state.stores().activities.list_by_creator(user.id).await?;
    let activities = Localizer::new(state.converter(), currency)
        .activities(activities)
        .await?;
    Ok(Envelope::localized("Activities fetched", currency, activities))
}

/// Show one activity. Flagged activities are only visible to their creator
/// and admins.
#[instrument(skip(state, viewer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    DisplayCurrency(currency): DisplayCurrency,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Activity>>, AppError> {
    let id: ActivityId = parse_id(&id)?;
    let activity = found(state.stores().activities.get(id).await?, "Activity")?;
    let visible = !activity.flagged
        || viewer
            .as_ref()
            .is_some_and(|v| v.can_see_hidden(activity.created_by));
    if !visible {
        return Err(AppError::NotFound("Activity not found".to_string()));
    }

    let activity = Localizer::new(state.converter(), currency)
        .activity(activity)
        .await?;
    Ok(Envelope::localized("Activity fetched", currency, activity))
}

/// Create an activity.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<ActivityInput>,
) -> Result<(StatusCode, Json<Envelope<Activity>>), AppError> {
    user.require_role(ADVERTISERS)?;
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let activity = state.stores().activities.create(user.id, input).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::ok("Activity created", activity),
    ))
}

/// Update an activity. Creator or admin.
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ActivityUpdate>,
) -> Result<Json<Envelope<Activity>>, AppError> {
    let id: ActivityId = parse_id(&id)?;
    let activities = state.stores().activities.as_ref();
    let existing = found(activities.get(id).await?, "Activity")?;
    user.require_owner(existing.created_by)?;

    let activity = activities.update(id, update).await?;
    Ok(Envelope::ok("Activity updated", activity))
}

/// Delete an activity. Creator or admin.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    let id: ActivityId = parse_id(&id)?;
    let activities = state.stores().activities.as_ref();
    let existing = found(activities.get(id).await?, "Activity")?;
    user.require_owner(existing.created_by)?;

    activities.delete(id).await?;
    Ok(Envelope::ok("Activity deleted", ()))
}

/// Flag or unflag an activity. Admin only.
#[instrument(skip(state, user, input), fields(user_id = %user.id, flagged = input.flagged))]
pub async fn flag(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<FlagInput>,
) -> Result<Json<Envelope<Activity>>, AppError> {
    let id: ActivityId = parse_id(&id)?;
    user.require_role(&[AccountType::Admin])?;
    let activity = state
        .stores()
        .activities
        .set_flagged(id, input.flagged)
        .await?;
    let message = if input.flagged {
        "Activity flagged"
    } else {
        "Activity unflagged"
    };
    Ok(Envelope::ok(message, activity))
}
