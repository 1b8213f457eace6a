//! # storefront-core: Pricing and Checkout Logic
//!
//! Everything that decides what a shopper pays lives here, as pure functions
//! with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    storefront-api (axum)                        │   │
//! │  │   price-info ──► cart routes ──► checkout quote ──► checkout    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ storefront-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │ variant  │ │   cart   │ │ delivery │ │     checkout     │  │   │
//! │  │   │ pricing  │ │  store   │ │ tip      │ │ ChargeRequest    │  │   │
//! │  │   │          │ │          │ │ payment  │ │                  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • PURE FUNCTIONS                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 storefront-db (SQLite via sqlx)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money in minor units
//! - [`variant`] - Tagged variant model and lenient catalog parsing
//! - [`pricing`] - Price ranges and unit price resolution
//! - [`cart`] - Cart lines, merge policy, subtotal
//! - [`store`] - `CartStore` get/set/subscribe seam
//! - [`delivery`] - Free-delivery threshold and flat fee
//! - [`tip`] - Preset vs custom tip
//! - [`payment`] - Full/partial payment split
//! - [`checkout`] - Charge request assembly
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::{compute_delivery_fee, compute_split, Money, PaymentType};
//!
//! let subtotal = Money::from_major(1000);
//! let fee = compute_delivery_fee(subtotal);
//! assert_eq!(fee, Money::from_major(100));
//!
//! let split = compute_split(subtotal + fee, PaymentType::Partial);
//! assert_eq!(split.due_now, Money::from_major(220));
//! assert_eq!(split.due_later, Money::from_major(880));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod delivery;
pub mod error;
pub mod money;
pub mod payment;
pub mod pricing;
pub mod store;
pub mod tip;
pub mod types;
pub mod validation;
pub mod variant;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Badge, Cart, CartLine, CartTotals, CustomOptions, NewCartLine};
pub use checkout::{build_charge_request, ChargeItem, ChargeRequest, ChargeResponse, CheckoutAmounts, CustomerInfo};
pub use delivery::{compute_delivery_fee, DeliveryPolicy};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use payment::{compute_split, PaymentSplit, PaymentType};
pub use pricing::{resolve_price_info, resolve_unit_price, PriceInfo};
pub use store::{CartListener, CartStore, MemoryCartStore, SubscriptionId};
pub use tip::{resolve_tip, TipSelection};
pub use types::Product;
pub use variant::{RawVariant, SizePrice, Variant, VariantAttribute, VariantKind};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Catches typos like 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price (major units) a cart line may carry, badges included.
///
/// With `MAX_ITEM_QUANTITY` and `MAX_CART_ITEMS` this keeps every cart total
/// far inside `i64` minor units.
pub const MAX_UNIT_PRICE: i64 = 10_000_000;

/// Highest tip (major units) accepted at checkout.
pub const MAX_TIP: i64 = 50_000;

/// Most badges on a single line.
pub const MAX_BADGES_PER_LINE: usize = 5;

/// Subtotal (major units) at or above which delivery is free.
pub const FREE_DELIVERY_THRESHOLD: i64 = 2000;

/// Delivery fee (major units) below the threshold.
pub const FLAT_DELIVERY_FEE: i64 = 100;

/// Share of the total charged up front on partial payment, in basis points.
pub const PARTIAL_PAYMENT_BPS: u32 = 2000;
