//! # Catalog Routes
//!
//! Read-only price information for listing cards and product pages.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use storefront_core::{PriceInfo, Product, Variant};

use crate::config::StoreConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Largest listing page.
const MAX_LIST_LIMIT: u32 = 100;

/// Product page pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfoResponse {
    pub product: Product,
    pub variants: Vec<Variant>,
    pub price_info: PriceInfo,
    /// e.g. `"৳1200.00"` or `"৳1200.00 - ৳1500.00"`
    pub price_label: String,
    pub discount_percent: Option<u32>,
}

/// Listing card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub cover_image: Option<String>,
    pub price_info: PriceInfo,
    pub price_label: String,
    pub is_featured: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

fn price_label(config: &StoreConfig, info: &PriceInfo) -> String {
    if info.is_range {
        format!(
            "{} - {}",
            config.format_currency(info.min_price),
            config.format_currency(info.max_price)
        )
    } else {
        config.format_currency(info.display_price)
    }
}

/// Active products with their resolved price ranges, featured first.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ProductCard>>> {
    let limit = query.limit.unwrap_or(20).clamp(1, MAX_LIST_LIMIT);
    let products = state.db.catalog().list_active(limit).await?;

    let mut cards = Vec::with_capacity(products.len());
    for product in products {
        let variants = state.db.catalog().list_variants(&product.id).await?;
        let info = product.price_info(&variants);
        cards.push(ProductCard {
            price_label: price_label(&state.config, &info),
            cover_image: product.cover_image().map(str::to_string),
            id: product.id,
            name: product.name,
            slug: product.slug,
            price_info: info,
            is_featured: product.is_featured,
        });
    }

    debug!(count = cards.len(), "Listed products");
    Ok(Json(cards))
}

/// Price range and variants for one product.
pub async fn price_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PriceInfoResponse>> {
    let product = state
        .db
        .catalog()
        .get_product(&id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    let variants = state.db.catalog().list_variants(&product.id).await?;
    let info = product.price_info(&variants);

    Ok(Json(PriceInfoResponse {
        price_label: price_label(&state.config, &info),
        discount_percent: product.discount_percent(),
        price_info: info,
        product,
        variants,
    }))
}
