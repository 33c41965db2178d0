//! Museum route handlers.
//!
//! Ticket prices are stored in the base currency and localized on every read.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use tripmate_core::{AccountType, MuseumId, TagId};

use super::{ApiJson, ApiQuery, Envelope, found, parse_id};
use crate::error::AppError;
use crate::middleware::{DisplayCurrency, RequireAuth};
use crate::models::{Museum, MuseumInput, MuseumUpdate};
use crate::services::pricing::Localizer;
use crate::state::AppState;

/// Roles that manage museums.
const CURATORS: &[AccountType] = &[AccountType::TourismGovernor, AccountType::Admin];

/// Query for `GET /museums/tags`.
#[derive(Debug, Deserialize)]
pub struct TagQuery {
    #[serde(rename = "tagIds", default)]
    pub tag_ids: String,
}

impl TagQuery {
    /// Parse the comma-separated id list. Empty or malformed lists are rejected.
    fn parse(&self) -> Result<Vec<TagId>, AppError> {
        let ids = self
            .tag_ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<TagId>, _>>()?;
        if ids.is_empty() {
            return Err(AppError::Validation(
                "tagIds must name at least one tag".to_string(),
            ));
        }
        Ok(ids)
    }
}

/// List all museums with localized ticket prices.
#[instrument(skip(state), fields(currency = %currency))]
pub async fn index(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
) -> Result<Json<Envelope<Vec<Museum>>>, AppError> {
    let museums = state.stores().museums.list().await?;
    let museums = Localizer::new(state.converter(), currency)
        .museums(museums)
        .await?;
    Ok(Envelope::localized("Museums fetched", currency, museums))
}

/// List museums the caller created.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    DisplayCurrency(currency): DisplayCurrency,
) -> Result<Json<Envelope<Vec<Museum>>>, AppError> {
    user.require_role(CURATORS)?;
    let museums = state.stores().museums.list_by_creator(user.id).await?;
    let museums = Localizer::new(state.converter(), currency)
        .museums(museums)
        .await?;
    Ok(Envelope::localized("Museums fetched", currency, museums))
}

/// List museums carrying any of the given tags.
#[instrument(skip(state, query), fields(currency = %currency))]
pub async fn by_tags(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
    ApiQuery(query): ApiQuery<TagQuery>,
) -> Result<Json<Envelope<Vec<Museum>>>, AppError> {
    let tags = query.parse()?;
    let museums = state.stores().museums.list_by_tags(&tags).await?;
    let museums = Localizer::new(state.converter(), currency)
        .museums(museums)
        .await?;
    Ok(Envelope::localized("Museums fetched", currency, museums))
}

/// Show one museum.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Museum>>, AppError> {
    let id: MuseumId = parse_id(&id)?;
    let museum = found(state.stores().museums.get(id).await?, "Museum")?;
    let museum = Localizer::new(state.converter(), currency)
        .museum(museum)
        .await?;
    Ok(Envelope::localized("Museum fetched", currency, museum))
}

/// Create a museum.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<MuseumInput>,
) -> Result<(StatusCode, Json<Envelope<Museum>>), AppError> {
    user.require_role(CURATORS)?;
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let museum = state.stores().museums.create(user.id, input).await?;
    tracing::info!(museum_id = %museum.id, "Museum created");
    Ok((StatusCode::CREATED, Envelope::ok("Museum created", museum)))
}

/// Update a museum. Creator or admin.
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<MuseumUpdate>,
) -> Result<Json<Envelope<Museum>>, AppError> {
    let id: MuseumId = parse_id(&id)?;
    user.require_role(CURATORS)?;
    let museums = state.stores().museums.as_ref();
    let existing = found(museums.get(id).await?, "Museum")?;
    user.require_owner(existing.created_by)?;

    let museum = museums.update(id, update).await?;
    Ok(Envelope::ok("Museum updated", museum))
}

/// Delete a museum. Creator or admin.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    let id: MuseumId = parse_id(&id)?;
    user.require_role(CURATORS)?;
    let museums = state.stores().museums.as_ref();
    let existing = found(museums.get(id).await?, "Museum")?;
    user.require_owner(existing.created_by)?;

    museums.delete(id).await?;
    Ok(Envelope::ok("Museum deleted", ()))
}
