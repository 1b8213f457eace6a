//! # Checkout Reconciliation
//!
//! Composes cart subtotal, delivery fee, tip and payment split into the
//! amounts shown at checkout and the charge request sent to the gateway.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout                                        │
//! │                                                                         │
//! │  Cart lines ──► subtotal ──┐                                           │
//! │                            ├──► total ──► compute_split ──┐            │
//! │  DeliveryPolicy ──► fee ───┤                              │            │
//! │  TipSelection ──► tip ─────┘                              ▼            │
//! │                                                  CheckoutAmounts       │
//! │  CustomerInfo ──► validate ──► missing? ──► ValidationError            │
//! │                                   │                                     │
//! │                                   └── ok ──► ChargeRequest ──► gateway │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A request is either complete or not built at all; a partial payload never
//! leaves this module.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{CartLine, CustomOptions};
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::payment::{compute_split, PaymentType};
use crate::validation::{validate_email, validate_phone, validate_tip, ValidationResult};

// =============================================================================
// Customer
// =============================================================================

/// Contact and shipping details collected on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CustomerInfo {
    /// Required fields that are empty after trimming, in form order.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field.to_string())
        .collect()
    }

    /// Checks presence first, then email and phone format.
    pub fn validate(&self) -> ValidationResult<()> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields { fields: missing });
        }

        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        Ok(())
    }
}

// =============================================================================
// Amounts
// =============================================================================

/// Everything the checkout summary shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutAmounts {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub tip: Money,
    pub total: Money,
    pub payment_type: PaymentType,
    pub due_now: Money,
    pub due_later: Money,
}

impl CheckoutAmounts {
    /// Derives totals and the payment split.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::checkout::CheckoutAmounts;
    /// use storefront_core::delivery::compute_delivery_fee;
    /// use storefront_core::money::Money;
    /// use storefront_core::payment::PaymentType;
    ///
    /// let subtotal = Money::from_major(1000);
    /// let amounts = CheckoutAmounts::compute(
    ///     subtotal,
    ///     compute_delivery_fee(subtotal),
    ///     Money::from_major(100),
    ///     PaymentType::Partial,
    /// );
    /// assert_eq!(amounts.total, Money::from_major(1200));
    /// assert_eq!(amounts.due_now, Money::from_major(240));
    /// assert_eq!(amounts.due_later, Money::from_major(960));
    /// ```
    pub fn compute(subtotal: Money, delivery_fee: Money, tip: Money, payment_type: PaymentType) -> Self {
        let total = subtotal + delivery_fee + tip;
        let split = compute_split(total, payment_type);

        CheckoutAmounts {
            subtotal,
            delivery_fee,
            tip,
            total,
            payment_type,
            due_now: split.due_now,
            due_later: split.due_later,
        }
    }
}

// =============================================================================
// Charge Request
// =============================================================================

/// One purchased line as the payment gateway sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChargeItem {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub variant_label: Option<String>,
    pub price: Money,
    pub quantity: i64,
    pub custom_options: CustomOptions,
}

impl From<&CartLine> for ChargeItem {
    fn from(line: &CartLine) -> Self {
        ChargeItem {
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            name: line.name.clone(),
            variant_label: line.variant_label.clone(),
            price: line.unit_price,
            quantity: line.quantity,
            custom_options: line.custom_options.clone(),
        }
    }
}

/// Payload posted to the payment gateway.
///
/// `total_amount` is what is charged now; `remaining_amount` is collected on
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub items: Vec<ChargeItem>,
    pub customer: CustomerInfo,
    pub currency: String,
    pub payment_type: PaymentType,
    pub subtotal: Money,
    pub delivery_charge: Money,
    pub tip_amount: Money,
    pub total_amount: Money,
    pub remaining_amount: Money,
}

impl ChargeRequest {
    /// Full order value (charged now plus collected on delivery).
    pub fn order_total(&self) -> Money {
        self.total_amount + self.remaining_amount
    }
}

/// The payment gateway's reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResponse {
    pub success: bool,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Builds the charge request, refusing anything incomplete.
///
/// ## Errors
/// - `ValidationError::EmptyCart` when there are no lines
/// - `ValidationError::MissingFields` naming every blank required customer field
/// - Email/phone format errors from `CustomerInfo::validate`
/// - `ValidationError::OutOfRange` for a tip above `MAX_TIP`
pub fn build_charge_request(
    lines: &[CartLine],
    delivery_fee: Money,
    tip: Money,
    payment_type: PaymentType,
    customer: &CustomerInfo,
    currency: &str,
) -> CoreResult<ChargeRequest> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyCart.into());
    }
    customer.validate()?;
    validate_tip(tip)?;

    let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
    let amounts = CheckoutAmounts::compute(subtotal, delivery_fee, tip, payment_type);

    Ok(ChargeRequest {
        items: lines.iter().map(ChargeItem::from).collect(),
        customer: customer.clone(),
        currency: currency.to_string(),
        payment_type,
        subtotal: amounts.subtotal,
        delivery_charge: amounts.delivery_fee,
        tip_amount: amounts.tip,
        total_amount: amounts.due_now,
        remaining_amount: amounts.due_later,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
