//! # Cart Aggregator
//!
//! Line items chosen by a shopper and the subtotal they add up to.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Shopper Action           Operation               Cart Change           │
//! │  ──────────────           ─────────               ───────────           │
//! │                                                                         │
//! │  Add to cart ────────────► add_item() ──────────► merge or push        │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ───► lines[i].qty = n     │
//! │                            (n <= 0 removes)                             │
//! │                                                                         │
//! │  Click remove ───────────► remove_item() ───────► lines.remove(i)      │
//! │                                                                         │
//! │  Order placed ───────────► clear() ─────────────► lines.clear()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge Policy
//! Adding a selection whose `(product_id, variant_id, variant_label,
//! custom_options)` signature matches an existing line increases that line's
//! quantity. The label carries the chosen size, so two sizes of one variant
//! stay separate lines. The existing line keeps its original unit price
//! snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_price, validate_quantity, ValidationResult};
use crate::{MAX_BADGES_PER_LINE, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Longest embroidered name, in characters.
const MAX_EMBROIDERY_NAME: usize = 20;

/// Longest embroidered number, in characters.
const MAX_EMBROIDERY_NUMBER: usize = 3;

// =============================================================================
// Custom Options
// =============================================================================

/// A badge patch added to a jersey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Badge {
    pub name: String,
    /// Surcharge for this badge, already included in the line's unit price.
    pub price: Money,
}

/// Personalisation chosen for a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomOptions {
    #[serde(default)]
    pub embroidery_name: Option<String>,
    #[serde(default)]
    pub embroidery_number: Option<String>,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

impl CustomOptions {
    /// True when no personalisation was chosen.
    pub fn is_empty(&self) -> bool {
        self.embroidery_name.is_none() && self.embroidery_number.is_none() && self.badges.is_empty()
    }

    /// Sum of badge surcharges.
    pub fn badge_total(&self) -> Money {
        self.badges.iter().map(|b| b.price).sum()
    }

    /// Sets every badge's surcharge to the store's badge price.
    ///
    /// Whatever price arrived with the request is discarded.
    pub fn price_badges(&mut self, price: Money) {
        for badge in &mut self.badges {
            badge.price = price;
        }
    }

    /// Checks personalisation limits and badge prices.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.badges.len() > MAX_BADGES_PER_LINE {
            return Err(ValidationError::OutOfRange {
                field: "badges".to_string(),
                min: 0,
                max: MAX_BADGES_PER_LINE as i64,
            });
        }

        let too_long = |text: &Option<String>, max: usize| {
            text.as_deref().is_some_and(|t| t.chars().count() > max)
        };
        if too_long(&self.embroidery_name, MAX_EMBROIDERY_NAME) {
            return Err(ValidationError::TooLong {
                field: "embroideryName".to_string(),
                max: MAX_EMBROIDERY_NAME,
            });
        }
        if too_long(&self.embroidery_number, MAX_EMBROIDERY_NUMBER) {
            return Err(ValidationError::TooLong {
                field: "embroideryNumber".to_string(),
                max: MAX_EMBROIDERY_NUMBER,
            });
        }

        for badge in &self.badges {
            validate_price(badge.price)?;
        }
        Ok(())
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// What the caller supplies when adding to cart.
///
/// `unit_price` must already be resolved (see `pricing::resolve_unit_price`)
/// and include any badge surcharges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub variant_label: Option<String>,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    #[serde(default)]
    pub custom_options: CustomOptions,
}

/// A line in the shopping cart.
///
/// ## Price Freezing
/// `unit_price` is captured when the line is created. Catalog price changes
/// made later in the session never reach an existing line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Line identifier (UUID v4).
    pub line_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Label of the chosen variant at time of adding (frozen).
    pub variant_label: Option<String>,
    /// Product name at time of adding (frozen).
    pub name: String,
    /// Unit price at time of adding (frozen).
    pub unit_price: Money,
    pub quantity: i64,
    pub custom_options: CustomOptions,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_new(line: NewCartLine) -> Self {
        CartLine {
            line_id: Uuid::new_v4().to_string(),
            product_id: line.product_id,
            variant_id: line.variant_id,
            variant_label: line.variant_label,
            name: line.name,
            unit_price: line.unit_price,
            quantity: line.quantity,
            custom_options: line.custom_options,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    fn same_selection(&self, line: &NewCartLine) -> bool {
        self.product_id == line.product_id
            && self.variant_id == line.variant_id
            && self.variant_label == line.variant_label
            && self.custom_options == line.custom_options
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by selection signature (adding again merges)
/// - Quantity is always in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
/// - Insertion order is display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Rebuilds a cart from persisted lines, keeping their order.
    pub fn from_lines(lines: Vec<CartLine>, created_at: DateTime<Utc>) -> Self {
        Cart { lines, created_at }
    }

    /// Adds a selection, merging into an identical line when present.
    ///
    /// ## Returns
    /// The line that now holds the selection.
    pub fn add_item(&mut self, line: NewCartLine) -> CoreResult<&CartLine> {
        validate_quantity(line.quantity)?;
        validate_price(line.unit_price)?;
        line.custom_options.validate()?;

        if let Some(index) = self.lines.iter().position(|l| l.same_selection(&line)) {
            let existing = &mut self.lines[index];
            let new_qty = existing.quantity + line.quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = new_qty;
            debug!(line_id = %existing.line_id, quantity = new_qty, "Merged into existing cart line");
            return Ok(&self.lines[index]);
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine::from_new(line));
        let index = self.lines.len() - 1;
        debug!(line_id = %self.lines[index].line_id, "Added cart line");
        Ok(&self.lines[index])
    }

    /// Updates the quantity of a line.
    ///
    /// ## Behavior
    /// - Quantity <= 0: removes the line
    /// - Quantity > max: returns error
    /// - Unknown line: returns error
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(line_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Removes a line by id.
    pub fn remove_item(&mut self, line_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.line_id != line_id);

        if self.lines.len() == initial_len {
            Err(CoreError::LineNotFound(line_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Empties the cart (after a successful order submission).
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Takes off what an accepted order paid for.
    ///
    /// Each charged line's quantity is subtracted from the line with the same
    /// id. Lines added or topped up after the order was priced stay in the
    /// cart.
    pub fn settle(&mut self, charged: &[CartLine]) {
        for paid in charged {
            let Some(index) = self.lines.iter().position(|l| l.line_id == paid.line_id) else {
                continue;
            };

            let line = &mut self.lines[index];
            if line.quantity > paid.quantity {
                line.quantity -= paid.quantity;
            } else {
                self.lines.remove(index);
            }
        }

        if self.lines.is_empty() {
            self.created_at = Utc::now();
        }
    }

    /// Lines in display order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Looks up a line by id.
    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    /// Number of lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of `unit_price × quantity` over all lines.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
