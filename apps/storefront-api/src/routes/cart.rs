//! # Cart Routes
//!
//! Per-session cart manipulation.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│ Payment  │       │
//! │  │  Cart    │     │          │     │  Form    │     │   Page   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                  │             │
//! │                   add_item                     gateway accepted         │
//! │                   update_item                  (cart cleared)           │
//! │                   remove_item                                           │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use storefront_core::validation::validate_uuid;
use storefront_core::{
    resolve_unit_price, Cart, CartLine, CartStore, CartTotals, CoreError, CustomOptions,
    NewCartLine,
};

use crate::error::{ApiError, ApiResult};
use crate::routes::validate_session;
use crate::state::AppState;

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    pub subtotal_formatted: String,
}

impl CartResponse {
    fn new(cart: &Cart, state: &AppState) -> Self {
        CartResponse {
            lines: cart.lines().to_vec(),
            totals: CartTotals::from(cart),
            subtotal_formatted: state.config.format_currency(cart.subtotal()),
        }
    }
}

/// A shopper's selection from the product page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub custom_options: CustomOptions,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// Gets the current cart contents.
pub async fn get_cart(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    validate_session(&session)?;

    let cart = state.carts.snapshot(&session).await?;
    Ok(Json(CartResponse::new(&cart, &state)))
}

/// Adds a selection to the cart.
///
/// ## Price Resolution
/// The unit price is resolved here, once, and frozen on the line:
/// exact size price, else the variant's cheapest price, else the product
/// base price, plus the store's badge price for each badge.
pub async fn add_item(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(mut request): Json<AddItemRequest>,
) -> ApiResult<(StatusCode, Json<CartResponse>)> {
    validate_session(&session)?;
    debug!(session = %session, product_id = %request.product_id, "add_item");

    request.custom_options.price_badges(state.config.badge_price);
    request.custom_options.validate()?;

    let product = state
        .db
        .catalog()
        .get_product(&request.product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::not_found("Product", &request.product_id))?;

    let variant = match &request.variant_id {
        Some(variant_id) => Some(
            state
                .db
                .catalog()
                .get_variant(&product.id, variant_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Variant", variant_id))?,
        ),
        None => None,
    };

    let size = request.size.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let unit_price = resolve_unit_price(product.price, variant.as_ref(), size)
        + request.custom_options.badge_total();

    if !unit_price.is_positive() {
        return Err(CoreError::InvalidAmount {
            reason: format!("{} has no price for this selection", product.name),
        }
        .into());
    }

    let variant_label = match &variant {
        Some(variant) => variant.label(size),
        None => size.map(str::to_string),
    };

    let new_line = NewCartLine {
        product_id: product.id.clone(),
        variant_id: variant.as_ref().map(|v| v.id.clone()),
        variant_label,
        name: product.name.clone(),
        unit_price,
        quantity: request.quantity,
        custom_options: request.custom_options,
    };

    let store = state.carts.store(&session).await?;
    let line_id = store.update(|cart| cart.add_item(new_line).map(|line| line.line_id.clone()))?;

    info!(session = %session, line_id = %line_id, unit_price = %unit_price, "Item added to cart");
    Ok((StatusCode::CREATED, Json(CartResponse::new(&store.get(), &state))))
}

/// Sets a line's quantity; zero or less removes it.
pub async fn update_item(
    State(state): State<AppState>,
    Path((session, line_id)): Path<(String, String)>,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<Json<CartResponse>> {
    validate_session(&session)?;
    validate_uuid(&line_id)?;
    debug!(session = %session, line_id = %line_id, quantity = request.quantity, "update_item");

    let store = state.carts.store(&session).await?;
    store.update(|cart| cart.update_quantity(&line_id, request.quantity))?;

    Ok(Json(CartResponse::new(&store.get(), &state)))
}

/// Removes a line.
pub async fn remove_item(
    State(state): State<AppState>,
    Path((session, line_id)): Path<(String, String)>,
) -> ApiResult<Json<CartResponse>> {
    validate_session(&session)?;
    validate_uuid(&line_id)?;
    debug!(session = %session, line_id = %line_id, "remove_item");

    let store = state.carts.store(&session).await?;
    store.update(|cart| cart.remove_item(&line_id))?;

    Ok(Json(CartResponse::new(&store.get(), &state)))
}

/// Empties the cart.
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> ApiResult<StatusCode> {
    validate_session(&session)?;

    state.carts.clear(&session);
    Ok(StatusCode::NO_CONTENT)
}
