//! Cart route handlers.
//!
//! Each tourist has one cart holding at most one line per product. Adding a
//! product that is already present replaces its quantity.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use tripmate_core::{AccountType, ProductId};

use super::{ApiJson, CartEnvelope, parse_id};
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{DisplayCurrency, RequireAuth};
use crate::models::{Cart, CartChange, CartEntry};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Body of `POST /cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: String,
    pub quantity: i64,
}

fn service(state: &AppState) -> CartService<'_> {
    CartService::new(
        state.stores().carts.as_ref(),
        state.stores().products.as_ref(),
    )
}

/// Show the caller's cart with prices in the display currency.
#[instrument(skip(state, user), fields(user_id = %user.id, currency = %currency))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    DisplayCurrency(currency): DisplayCurrency,
) -> Result<Json<CartEnvelope<Vec<CartEntry>>>, AppError> {
    user.require_role(&[AccountType::Tourist])?;
    let entries = service(&state)
        .get_cart(user.id, state.converter(), currency)
        .await?;

    Ok(Json(CartEnvelope {
        message: "Cart fetched".to_string(),
        currency: Some(currency),
        cart: entries,
    }))
}

/// Add a product or replace its quantity.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddToCart>,
) -> Result<(StatusCode, Json<CartEnvelope<Cart>>), AppError> {
    let product: ProductId = parse_id(&body.product_id)?;
    user.require_role(&[AccountType::Tourist])?;

    let outcome = service(&state)
        .add_product(user.id, product, body.quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Cart line saved",
        Some(&[("product_id", &body.product_id)]),
    );

    let (status, message) = match outcome.change {
        CartChange::Added => (StatusCode::CREATED, "Product added to cart"),
        CartChange::Updated { .. } => (StatusCode::OK, "Cart quantity updated"),
    };
    Ok((
        status,
        Json(CartEnvelope {
            message: message.to_string(),
            currency: None,
            cart: outcome.cart,
        }),
    ))
}

/// Remove a product's line from the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<String>,
) -> Result<Json<CartEnvelope<Cart>>, AppError> {
    let product: ProductId = parse_id(&product_id)?;
    user.require_role(&[AccountType::Tourist])?;

    let cart = service(&state).remove_product(user.id, product).await?;
    Ok(Json(CartEnvelope {
        message: "Product removed from cart".to_string(),
        currency: None,
        cart,
    }))
}
