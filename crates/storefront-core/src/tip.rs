//! # Tip Selector
//!
//! A shopper either picks a preset tip or types a custom one, never both.
//!
//! ```text
//!   type "50"      → Custom("50")     amount = 50
//!   pick preset 100 → Preset(100)     amount = 100   (custom text dropped)
//!   type "abc"     → Custom("abc")    amount = 0, validate() fails
//! ```
//!
//! Tips are capped at `MAX_TIP`; anything larger counts as zero and fails
//! validation, so a typed amount can never push the order total out of range.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_tip, ValidationResult};

/// Resolves the tip amount from a preset and optional custom text.
///
/// Non-empty custom text that parses to an amount in `0..=MAX_TIP` wins.
/// Otherwise the preset is used (same range), otherwise zero. Invalid text
/// never panics; it simply resolves to zero.
pub fn resolve_tip(preset: Option<Money>, custom: Option<&str>) -> Money {
    let in_range = |amount: &Money| validate_tip(*amount).is_ok();

    match custom.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => Money::parse_major(text).filter(in_range).unwrap_or_default(),
        None => preset.filter(in_range).unwrap_or_default(),
    }
}

/// The shopper's current tip choice.
///
/// Mutual exclusivity lives here rather than in the view: every transition
/// replaces the previous choice wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum TipSelection {
    #[default]
    None,
    Preset(Money),
    Custom(String),
}

impl TipSelection {
    /// Builds a selection from request fields; custom text takes priority.
    pub fn from_parts(preset: Option<Money>, custom: Option<String>) -> Self {
        match (preset, custom.filter(|c| !c.trim().is_empty())) {
            (_, Some(text)) => TipSelection::Custom(text),
            (Some(amount), None) => TipSelection::Preset(amount),
            (None, None) => TipSelection::None,
        }
    }

    /// Picks a preset, discarding any custom text.
    pub fn select_preset(&mut self, amount: Money) {
        *self = TipSelection::Preset(amount);
    }

    /// Sets custom text, discarding any preset.
    pub fn set_custom(&mut self, text: impl Into<String>) {
        *self = TipSelection::Custom(text.into());
    }

    /// Removes any tip.
    pub fn clear(&mut self) {
        *self = TipSelection::None;
    }

    /// Tip amount for this selection.
    pub fn amount(&self) -> Money {
        match self {
            TipSelection::None => Money::zero(),
            TipSelection::Preset(amount) => resolve_tip(Some(*amount), None),
            TipSelection::Custom(text) => resolve_tip(None, Some(text)),
        }
    }

    /// Rejects custom text that is not a number and amounts outside `0..=MAX_TIP`.
    pub fn validate(&self) -> ValidationResult<()> {
        match self {
            TipSelection::Custom(text) if !text.trim().is_empty() => {
                let amount = Money::parse_major(text).ok_or_else(|| ValidationError::InvalidFormat {
                    field: "tip".to_string(),
                    reason: "must be a number".to_string(),
                })?;
                validate_tip(amount)
            }
            TipSelection::Preset(amount) => validate_tip(*amount),
            _ => Ok(()),
        }
    }
}
