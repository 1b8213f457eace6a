//! # Variant Price Resolution
//!
//! One resolver for every listing surface (product cards, collection grids,
//! search results, product detail) so they can no longer drift apart.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_price_info(base_price, variants)                              │
//! │                                                                         │
//! │  1. Collect every price > 0                                            │
//! │     • Sized variant → every size-table entry                           │
//! │     • Flat variant  → its direct price                                 │
//! │                                                                         │
//! │  2. Nothing collected?                                                 │
//! │     └── min = max = display = base_price, is_range = false             │
//! │                                                                         │
//! │  3. Otherwise                                                          │
//! │     └── min, max of collected; display = min; is_range = min != max    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Zero and negative prices are treated as "unpriced" everywhere.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::variant::Variant;

/// Price summary for a listing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    pub min_price: Money,
    pub max_price: Money,
    pub display_price: Money,
    pub is_range: bool,
}

impl PriceInfo {
    /// A single, non-range price.
    pub fn single(price: Money) -> Self {
        PriceInfo {
            min_price: price,
            max_price: price,
            display_price: price,
            is_range: false,
        }
    }
}

/// Computes the min/max sellable price and display price for a product.
///
/// ## Example
/// ```rust
/// use storefront_core::money::Money;
/// use storefront_core::pricing::resolve_price_info;
/// use storefront_core::variant::{RawVariant, Variant};
///
/// let variants: Vec<Variant> = [500, 800, 500]
///     .iter()
///     .map(|p| Variant::from_raw(RawVariant {
///         id: format!("v{p}"),
///         price: Some(serde_json::json!(p)),
///         ..RawVariant::default()
///     }))
///     .collect();
///
/// let info = resolve_price_info(Money::from_major(650), &variants);
/// assert_eq!(info.min_price, Money::from_major(500));
/// assert_eq!(info.max_price, Money::from_major(800));
/// assert!(info.is_range);
/// ```
pub fn resolve_price_info(base_price: Money, variants: &[Variant]) -> PriceInfo {
    let mut prices = variants
        .iter()
        .flat_map(Variant::prices)
        .filter(Money::is_positive);

    let Some(first) = prices.next() else {
        return PriceInfo::single(base_price);
    };

    let (min_price, max_price) = prices.fold((first, first), |(lo, hi), price| {
        (lo.min(price), hi.max(price))
    });

    PriceInfo {
        min_price,
        max_price,
        display_price: min_price,
        is_range: min_price != max_price,
    }
}

/// Resolves the unit price captured when a shopper adds a selection to cart.
///
/// ## Precedence
/// 1. Exact size match on a sized variant (if that price is positive)
/// 2. The variant's cheapest positive price
/// 3. The product's base price
pub fn resolve_unit_price(base_price: Money, variant: Option<&Variant>, size: Option<&str>) -> Money {
    let Some(variant) = variant else {
        return base_price;
    };

    if let Some(price) = size
        .and_then(|size| variant.price_for_size(size))
        .filter(Money::is_positive)
    {
        return price;
    }

    variant
        .prices()
        .into_iter()
        .filter(Money::is_positive)
        .min()
        .unwrap_or(base_price)
}

// =============================================================================
// Unit Tests
// =============================================================================
