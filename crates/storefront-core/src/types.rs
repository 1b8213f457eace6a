//! # Domain Types
//!
//! Catalog types shared by the storefront listing pages and checkout.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Variant      │   │   PriceInfo     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, slug       │◄──│  product (FK)   │──►│  min / max      │       │
//! │  │  price (base)   │   │  Sized | Flat   │   │  display        │       │
//! │  │  compare_price  │   │                 │   │  is_range       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products are created and edited by the admin back-office; the storefront
//! treats them as read-only.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::{resolve_price_info, PriceInfo};
use crate::validation::{validate_price, validate_product_name, validate_slug, ValidationResult};
use crate::variant::Variant;

// =============================================================================
// Product
// =============================================================================

/// A product listed in the storefront catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// URL slug used by listing pages.
    pub slug: String,

    /// Base price. Fallback for every variant without a usable price.
    pub price: Money,

    /// Optional "was" price shown struck through.
    pub compare_price: Option<Money>,

    /// Image references, first one is the cover.
    pub images: Vec<String>,

    /// Whether the product is visible in the storefront.
    pub is_active: bool,

    /// Whether the product appears in featured collections.
    pub is_featured: bool,

    /// Average review rating (0.0 - 5.0).
    pub average_rating: f32,

    /// Number of approved reviews.
    pub review_count: u32,

    /// Category reference.
    pub category_id: Option<String>,
}

impl Product {
    /// Resolves the price range to display for this product.
    pub fn price_info(&self, variants: &[Variant]) -> PriceInfo {
        resolve_price_info(self.price, variants)
    }

    /// Whole percentage saved against the compare-at price.
    ///
    /// Returns `None` unless the compare price is strictly above the base price.
    ///
    /// ## Example
    /// ```text
    /// price 800, compare 1000  →  Some(20)
    /// price 800, compare 800   →  None
    /// ```
    pub fn discount_percent(&self) -> Option<u32> {
        let compare = self.compare_price?;
        if compare <= self.price || !compare.is_positive() {
            return None;
        }

        let saved = (compare - self.price).minor();
        Some(((saved * 100) / compare.minor()) as u32)
    }

    /// Checks what the catalog needs before a product can be stored.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.name)?;
        validate_slug(&self.slug)?;
        validate_price(self.price)?;
        if let Some(compare) = self.compare_price {
            validate_price(compare)?;
        }
        Ok(())
    }

    /// Cover image, if any.
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, compare: Option<i64>) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Home Jersey".to_string(),
            slug: "home-jersey".to_string(),
            price: Money::from_major(price),
            compare_price: compare.map(Money::from_major),
            images: vec!["front.jpg".to_string(), "back.jpg".to_string()],
            is_active: true,
            is_featured: false,
            average_rating: 4.5,
            review_count: 12,
            category_id: None,
        }
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(product(800, Some(1000)).discount_percent(), Some(20));
        assert_eq!(product(999, Some(1000)).discount_percent(), Some(0));
        assert_eq!(product(800, Some(800)).discount_percent(), None);
        assert_eq!(product(800, None).discount_percent(), None);
    }

    #[test]
    fn test_validate() {
        assert!(product(800, Some(1000)).validate().is_ok());
        // Zero base price is allowed; variants carry the price
        assert!(product(0, None).validate().is_ok());

        let mut bad_slug = product(800, None);
        bad_slug.slug = "Home Jersey".to_string();
        assert!(bad_slug.validate().is_err());

        assert!(product(-1, None).validate().is_err());
        assert!(product(800, Some(-5)).validate().is_err());
    }

    #[test]
    fn test_cover_image() {
        assert_eq!(product(800, None).cover_image(), Some("front.jpg"));
    }

    #[test]
    fn test_price_info_without_variants_uses_base_price() {
        let info = product(650, None).price_info(&[]);
        assert_eq!(info.min_price, Money::from_major(650));
        assert_eq!(info.max_price, Money::from_major(650));
        assert!(!info.is_range);
    }
}
