//! # Variant Module
//!
//! Converts loosely typed catalog variants into a closed set of shapes.
//!
//! ## Boundary Conversion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog JSON (RawVariant)                 Closed shape (Variant)       │
//! │  ─────────────────────────                 ──────────────────────       │
//! │                                                                         │
//! │  { name: "Size", value: "XL",    ──►  attribute: Named { Size, XL }     │
//! │    price: 550 }                       kind: Flat { price: 550.00 }      │
//! │                                                                         │
//! │  { fabricType: "Mesh",           ──►  attribute: Fabric { Mesh }        │
//! │    sizes: "[{\"size\":\"M\",          kind: Sized { [M → 500.00,        │
//! │             \"price\":500}, ...]" }                   L → 650.00] }     │
//! │                                                                         │
//! │  { sizes: "[{oops" }             ──►  warn!, kind: Flat { price: None } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conversion never fails. Anything unparsable is logged and dropped, and the
//! pricing code falls back to the product's base price.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use ts_rs::TS;

use crate::money::Money;

/// Nested size tables may be serialized more than once by the admin forms.
const MAX_SIZE_TABLE_DEPTH: usize = 2;

// =============================================================================
// Raw Variant (catalog boundary)
// =============================================================================

/// Variant exactly as the catalog collaborator delivers it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub fabric_type: Option<String>,
    #[serde(default)]
    pub tracksuit_type: Option<String>,
    /// Number or numeric string, in major units.
    #[serde(default)]
    pub price: Option<Value>,
    /// Array of `{size, price}` or that array serialized into a string.
    #[serde(default)]
    pub sizes: Option<Value>,
}

// =============================================================================
// Closed Variant Shape
// =============================================================================

/// What distinguishes a variant from its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VariantAttribute {
    /// Free-form attribute such as "Size: XL" or "Fabric: Cotton".
    Named { name: String, value: String },
    /// Category-specific fabric type.
    Fabric {
        #[serde(rename = "fabricType")]
        fabric_type: String,
    },
    /// Category-specific tracksuit type.
    Tracksuit {
        #[serde(rename = "tracksuitType")]
        tracksuit_type: String,
    },
    /// No attribute recorded.
    Unlabeled,
}

/// One row of a nested size → price table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SizePrice {
    pub size: String,
    pub price: Money,
}

/// How a variant is priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VariantKind {
    /// Priced per size.
    Sized { sizes: Vec<SizePrice> },
    /// Single price for the whole variant, possibly absent.
    Flat { price: Option<Money> },
}

/// A product variant after boundary conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub attribute: VariantAttribute,
    pub kind: VariantKind,
}

impl Variant {
    /// Converts a catalog variant into its closed shape.
    ///
    /// A non-empty, parsable size table makes the variant `Sized`; otherwise
    /// it is `Flat` with whatever direct price parses (if any).
    pub fn from_raw(raw: RawVariant) -> Variant {
        let attribute = attribute_of(&raw);

        let sizes = match raw.sizes {
            Some(value) => parse_size_table(&raw.id, &value, 0),
            None => Vec::new(),
        };

        let kind = if sizes.is_empty() {
            let price = raw.price.as_ref().and_then(|value| {
                let parsed = money_from_json(value);
                if parsed.is_none() && !value.is_null() {
                    warn!(variant_id = %raw.id, price = %value, "Skipping unparsable variant price");
                }
                parsed
            });
            VariantKind::Flat { price }
        } else {
            VariantKind::Sized { sizes }
        };

        Variant {
            id: raw.id,
            attribute,
            kind,
        }
    }

    /// Every price this variant carries, in table order.
    pub fn prices(&self) -> Vec<Money> {
        match &self.kind {
            VariantKind::Sized { sizes } => sizes.iter().map(|s| s.price).collect(),
            VariantKind::Flat { price } => price.iter().copied().collect(),
        }
    }

    /// Price for an exact size label, if the variant is sized and has it.
    pub fn price_for_size(&self, size: &str) -> Option<Money> {
        match &self.kind {
            VariantKind::Sized { sizes } => sizes
                .iter()
                .find(|entry| entry.size.eq_ignore_ascii_case(size.trim()))
                .map(|entry| entry.price),
            VariantKind::Flat { .. } => None,
        }
    }

    /// Human label stored on cart lines, e.g. `"Fabric: Mesh / L"`.
    pub fn label(&self, size: Option<&str>) -> Option<String> {
        let base = match &self.attribute {
            VariantAttribute::Named { name, value } if value.is_empty() => Some(name.clone()),
            VariantAttribute::Named { name, value } => Some(format!("{}: {}", name, value)),
            VariantAttribute::Fabric { fabric_type } => Some(format!("Fabric: {}", fabric_type)),
            VariantAttribute::Tracksuit { tracksuit_type } => {
                Some(format!("Tracksuit: {}", tracksuit_type))
            }
            VariantAttribute::Unlabeled => None,
        };

        match (base, size.map(str::trim).filter(|s| !s.is_empty())) {
            (Some(base), Some(size)) => Some(format!("{} / {}", base, size)),
            (None, Some(size)) => Some(size.to_string()),
            (base, None) => base,
        }
    }
}

impl From<RawVariant> for Variant {
    fn from(raw: RawVariant) -> Self {
        Variant::from_raw(raw)
    }
}

// =============================================================================
// Lenient Parsing Helpers
// =============================================================================

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn attribute_of(raw: &RawVariant) -> VariantAttribute {
    if let Some(fabric_type) = non_empty(&raw.fabric_type) {
        return VariantAttribute::Fabric { fabric_type };
    }
    if let Some(tracksuit_type) = non_empty(&raw.tracksuit_type) {
        return VariantAttribute::Tracksuit { tracksuit_type };
    }

    match (non_empty(&raw.name), non_empty(&raw.value)) {
        (None, None) => VariantAttribute::Unlabeled,
        (name, value) => VariantAttribute::Named {
            name: name.unwrap_or_else(|| "Option".to_string()),
            value: value.unwrap_or_default(),
        },
    }
}

/// Reads a JSON number or numeric string as major units.
///
/// Numbers go through their textual form so no float arithmetic is involved.
pub fn money_from_json(value: &Value) -> Option<Money> {
    match value {
        Value::Number(n) => Money::parse_major(&n.to_string()),
        Value::String(s) => Money::parse_major(s),
        _ => None,
    }
}

fn parse_size_table(variant_id: &str, value: &Value, depth: usize) -> Vec<SizePrice> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| parse_size_entry(variant_id, entry))
            .collect(),
        Value::String(text) if text.trim().is_empty() => Vec::new(),
        Value::String(text) if depth < MAX_SIZE_TABLE_DEPTH => {
            match serde_json::from_str::<Value>(text) {
                Ok(inner) => parse_size_table(variant_id, &inner, depth + 1),
                Err(e) => {
                    warn!(variant_id = %variant_id, error = %e, "Skipping malformed size table");
                    Vec::new()
                }
            }
        }
        other => {
            warn!(variant_id = %variant_id, sizes = %other, "Size table is not a list, skipping");
            Vec::new()
        }
    }
}

fn parse_size_entry(variant_id: &str, entry: &Value) -> Option<SizePrice> {
    let size = match entry.get("size") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            warn!(variant_id = %variant_id, entry = %entry, "Size entry without a size label");
            return None;
        }
    };

    match entry.get("price").and_then(money_from_json) {
        Some(price) => Some(SizePrice { size, price }),
        None => {
            warn!(variant_id = %variant_id, size = %size, "Size entry without a usable price");
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
