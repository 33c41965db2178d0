//! Product route handlers.
//!
//! Reads are priced in the display currency; stored prices stay in the base
//! currency.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use tripmate_core::{AccountType, ProductId};

use super::{ApiJson, ApiQuery, Envelope, found, parse_id};
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{DisplayCurrency, RequireAuth};
use crate::models::{Product, ProductFilter, ProductInput, ProductUpdate, Review};
use crate::services::pricing::Localizer;
use crate::state::AppState;

/// Roles allowed to sell.
const SELLERS: &[AccountType] = &[AccountType::Seller, AccountType::Admin];

/// Body of `POST /products/{id}/reviews`.
#[derive(Debug, Deserialize)]
pub struct ReviewInput {
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// List products.
#[instrument(skip(state, filter), fields(currency = %currency))]
pub async fn index(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<Json<Envelope<Vec<Product>>>, AppError> {
    let products = state.stores().products.list(&filter).await?;
    let products = Localizer::new(state.converter(), currency)
        .products(products)
        .await?;
    Ok(Envelope::localized("Products fetched", currency, products))
}

/// List the caller's own products.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    DisplayCurrency(currency): DisplayCurrency,
) -> Result<Json<Envelope<Vec<Product>>>, AppError> {
    user.require_role(SELLERS)?;
    let filter = ProductFilter {
        seller: Some(user.id),
        ..ProductFilter::default()
    };
    let products = state.stores().products.list(&filter).await?;
    let products = Localizer::new(state.converter(), currency)
        .products(products)
        .await?;
    Ok(Envelope::localized("Products fetched", currency, products))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    DisplayCurrency(currency): DisplayCurrency,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Product>>, AppError> {
    let id: ProductId = parse_id(&id)?;
    let product = found(state.stores().products.get(id).await?, "Product")?;
    let product = Localizer::new(state.converter(), currency)
        .product(product)
        .await?;
    Ok(Envelope::localized("Product fetched", currency, product))
}

/// Create a product sold by the caller.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Envelope<Product>>), AppError> {
    user.require_role(SELLERS)?;
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let product = state.stores().products.create(user.id, input).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::ok("Product created", product),
    ))
}

/// Update a product. Seller or admin.
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Envelope<Product>>, AppError> {
    let id: ProductId = parse_id(&id)?;
    user.require_role(SELLERS)?;
    let products = state.stores().products.as_ref();
    let existing = found(products.get(id).await?, "Product")?;
    user.require_owner(existing.seller_id)?;

    let product = products.update(id, update).await?;
    Ok(Envelope::ok("Product updated", product))
}

/// Delete a product. Seller or admin.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    let id: ProductId = parse_id(&id)?;
    user.require_role(SELLERS)?;
    let products = state.stores().products.as_ref();
    let existing = found(products.get(id).await?, "Product")?;
    user.require_owner(existing.seller_id)?;

    products.delete(id).await?;
    Ok(Envelope::ok("Product deleted", ()))
}

/// Review a product. Tourists only.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<Envelope<Product>>), AppError> {
    let id: ProductId = parse_id(&id)?;
    user.require_role(&[AccountType::Tourist])?;
    if !(1..=5).contains(&input.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let product = state
        .stores()
        .products
        .add_review(
            id,
            Review {
                user: user.id,
                rating: input.rating,
                comment: input.comment,
                created_at: Utc::now(),
            },
        )
        .await?;

    let product_id = id.to_string();
    add_breadcrumb("product", "Reviewed product", Some(&[("product_id", &product_id)]));
    Ok((
        StatusCode::CREATED,
        Envelope::ok("Review added", product),
    ))
}
