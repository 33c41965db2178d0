//! Itinerary route handlers.
//!
//! The public list only shows active, unflagged itineraries. Creators and
//! admins still reach hidden ones through `/mine` and by id.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use tripmate_core::{AccountType, ItineraryId};

use super::activities::FlagInput;
use super::{ApiJson, ApiQuery, Envelope, found, parse_id};
use crate::error::AppError;
use crate::middleware::{DisplayCurrency, OptionalAuth, RequireAuth};
use crate::models::{Itinerary, ItineraryFilter, ItineraryInput, ItineraryUpdate};
use crate::services::pricing::Localizer;
use crate::state::AppState;

/// Roles that author itineraries.
const GUIDES: &[AccountType] = &[AccountType::TourGuide, AccountType::Admin];

/// Body of `PATCH /itineraries/{id}/active`.
#[derive(Debug, Deserialize)]
pub struct ActiveInput {
    pub active: bool,
}

/// List bookable itineraries.
#[instrument(skip(state, filter), fields(currency = %currency))]
pub async fn index(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
    ApiQuery(filter): ApiQuery<ItineraryFilter>,
) -> Result<Json<Envelope<Vec<Itinerary>>>, AppError> {
    let itineraries = state.stores().itineraries.list(&filter).await?;
    let itineraries = Localizer::new(state.converter(), currency)
        .itineraries(itineraries)
        .await?;
    Ok(Envelope::localized("Itineraries fetched", currency, itineraries))
}

/// List the caller's itineraries.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    DisplayCurrency(currency): DisplayCurrency,
) -> Result<Json<Envelope<Vec<Itinerary>>>, AppError> {
    user.require_role(GUIDES)?;
    let itineraries = state.stores().itineraries.list_by_creator(user.id).await?;
    let itineraries = Localizer::new(state.converter(), currency)
        .itineraries(itineraries)
        .await?;
    Ok(Envelope::localized("Itineraries fetched", currency, itineraries))
}

/// Show one itinerary.
#[instrument(skip(state, viewer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    DisplayCurrency(currency): DisplayCurrency,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Itinerary>>, AppError> {
    let id: ItineraryId = parse_id(&id)?;
    let itinerary = found(state.stores().itineraries.get(id).await?, "Itinerary")?;
    let hidden = itinerary.flagged || !itinerary.active;
    let visible = !hidden
        || viewer
            .as_ref()
            .is_some_and(|v| v.can_see_hidden(itinerary.created_by));
    if !visible {
        return Err(AppError::NotFound("Itinerary not found".to_string()));
    }

    let itinerary = Localizer::new(state.converter(), currency)
        .itinerary(itinerary)
        .await?;
    Ok(Envelope::localized("Itinerary fetched", currency, itinerary))
}

/// Create an itinerary.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<ItineraryInput>,
) -> Result<(StatusCode, Json<Envelope<Itinerary>>), AppError> {
    user.require_role(GUIDES)?;
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let itinerary = state.stores().itineraries.create(user.id, input).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::ok("Itinerary created", itinerary),
    ))
}

/// Update an itinerary. Creator or admin.
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ItineraryUpdate>,
) -> Result<Json<Envelope<Itinerary>>, AppError> {
    let id: ItineraryId = parse_id(&id)?;
    let itineraries = state.stores().itineraries.as_ref();
    let existing = found(itineraries.get(id).await?, "Itinerary")?;
    user.require_owner(existing.created_by)?;

    let itinerary = itineraries.update(id, update).await?;
    Ok(Envelope::ok("Itinerary updated", itinerary))
}

/// Delete an itinerary. Creator or admin.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    let id: ItineraryId = parse_id(&id)?;
    let itineraries = state.stores().itineraries.as_ref();
    let existing = found(itineraries.get(id).await?, "Itinerary")?;
    user.require_owner(existing.created_by)?;

    itineraries.delete(id).await?;
    Ok(Envelope::ok("Itinerary deleted", ()))
}

/// Flag or unflag an itinerary. Admin only.
#[instrument(skip(state, user, input), fields(user_id = %user.id, flagged = input.flagged))]
pub async fn flag(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<FlagInput>,
) -> Result<Json<Envelope<Itinerary>>, AppError> {
    let id: ItineraryId = parse_id(&id)?;
    user.require_role(&[AccountType::Admin])?;
    let itinerary = state
        .stores()
        .itineraries
        .set_flagged(id, input.flagged)
        .await?;
    let message = if input.flagged {
        "Itinerary flagged"
    } else {
        "Itinerary unflagged"
    };
    Ok(Envelope::ok(message, itinerary))
}

/// Activate or deactivate an itinerary. Creator or admin.
#[instrument(skip(state, user, input), fields(user_id = %user.id, active = input.active))]
pub async fn set_active(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ActiveInput>,
) -> Result<Json<Envelope<Itinerary>>, AppError> {
    let id: ItineraryId = parse_id(&id)?;
    let itineraries = state.stores().itineraries.as_ref();
    let existing = found(itineraries.get(id).await?, "Itinerary")?;
    user.require_owner(existing.created_by)?;

    let itinerary = itineraries.set_active(id, input.active).await?;
    let message = if input.active {
        "Itinerary activated"
    } else {
        "Itinerary deactivated"
    };
    Ok(Envelope::ok(message, itinerary))
}
