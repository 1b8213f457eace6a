//! # Checkout Routes
//!
//! Live order summary and order submission.
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Submission                                  │
//! │                                                                         │
//! │  POST /checkout/{session}                                              │
//! │       │                                                                 │
//! │       ├── checkout already running? ──────────► 409 CONFLICT            │
//! │       ├── tip invalid / preset not offered? ──► 400 VALIDATION_ERROR    │
//! │       ├── cart empty / customer incomplete? ──► 400 VALIDATION_ERROR    │
//! │       │                                          (gateway not called)   │
//! │       ▼                                                                 │
//! │  PaymentGateway::charge(ChargeRequest)                                  │
//! │       │                                                                 │
//! │       ├── success + paymentUrl ──► settle cart ─► 200 { paymentUrl }    │
//! │       ├── success: false ──────────────────────► 502 error text as-is  │
//! │       └── unreachable ─────────────────────────► 502, cart kept         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Settling takes off exactly the lines that were charged; anything added
//! while the gateway was answering stays in the cart.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use storefront_core::validation::ValidationResult;
use storefront_core::{
    build_charge_request, CartStore, CheckoutAmounts, CustomerInfo, Money, PaymentType,
    TipSelection, ValidationError,
};

use crate::config::StoreConfig;
use crate::error::{ApiError, ApiResult};
use crate::routes::validate_session;
use crate::state::AppState;

/// Summary inputs as the form currently stands.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Preset tip, minor units.
    #[serde(default)]
    pub tip_preset: Option<Money>,
    /// Custom tip as typed, major units.
    #[serde(default)]
    pub tip_custom: Option<String>,
    #[serde(default)]
    pub payment_type: PaymentType,
}

/// Amounts rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedAmounts {
    pub subtotal: String,
    pub delivery_fee: String,
    pub tip: String,
    pub total: String,
    pub due_now: String,
    pub due_later: String,
}

impl FormattedAmounts {
    fn new(config: &StoreConfig, amounts: &CheckoutAmounts) -> Self {
        FormattedAmounts {
            subtotal: config.format_currency(amounts.subtotal),
            delivery_fee: config.format_currency(amounts.delivery_fee),
            tip: config.format_currency(amounts.tip),
            total: config.format_currency(amounts.total),
            due_now: config.format_currency(amounts.due_now),
            due_later: config.format_currency(amounts.due_later),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub amounts: CheckoutAmounts,
    pub formatted: FormattedAmounts,
    pub remaining_for_free_delivery: Money,
    pub tip_presets: Vec<Money>,
    /// Set when the custom tip text is not a usable amount (tip counted as zero).
    pub tip_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer: CustomerInfo,
    #[serde(default)]
    pub tip_preset: Option<Money>,
    #[serde(default)]
    pub tip_custom: Option<String>,
    #[serde(default)]
    pub payment_type: PaymentType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub payment_url: String,
    pub amounts: CheckoutAmounts,
}

/// Builds the tip choice, refusing presets the store does not offer.
///
/// A refused preset is dropped from the selection so it never counts.
fn choose_tip(
    config: &StoreConfig,
    preset: Option<Money>,
    custom: Option<String>,
) -> (TipSelection, ValidationResult<()>) {
    let tip = TipSelection::from_parts(preset, custom);

    if let TipSelection::Preset(amount) = &tip {
        if !config.offers_tip(*amount) {
            let error = ValidationError::InvalidFormat {
                field: "tip".to_string(),
                reason: format!("{} is not an offered tip", config.format_currency(*amount)),
            };
            return (TipSelection::None, Err(error));
        }
    }

    let checked = tip.validate();
    (tip, checked)
}

/// Live order summary. Never fails on a bad tip; the error is reported alongside.
pub async fn quote(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<Json<QuoteResponse>> {
    validate_session(&session)?;

    let cart = state.carts.snapshot(&session).await?;
    let (tip, checked) = choose_tip(&state.config, request.tip_preset, request.tip_custom);
    let tip_error = checked.err().map(|e| e.to_string());

    let subtotal = cart.subtotal();
    let policy = state.config.delivery_policy();
    let amounts = CheckoutAmounts::compute(
        subtotal,
        policy.fee_for(subtotal),
        tip.amount(),
        request.payment_type,
    );

    Ok(Json(QuoteResponse {
        formatted: FormattedAmounts::new(&state.config, &amounts),
        amounts,
        remaining_for_free_delivery: policy.remaining_for_free(subtotal),
        tip_presets: state.config.tip_presets.clone(),
        tip_error,
    }))
}

/// Submits the order to the payment gateway.
///
/// ## Returns
/// The hosted payment page to redirect the shopper to. The charged lines
/// leave the cart only once the gateway has accepted the charge.
pub async fn submit(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    validate_session(&session)?;

    let _guard = state
        .carts
        .begin_checkout(&session)
        .ok_or_else(|| ApiError::conflict("A checkout for this cart is already in progress"))?;

    let cart = state.carts.snapshot(&session).await?;

    let (tip, checked) = choose_tip(&state.config, request.tip_preset, request.tip_custom);
    checked?;

    let policy = state.config.delivery_policy();
    let charge = build_charge_request(
        cart.lines(),
        policy.fee_for(cart.subtotal()),
        tip.amount(),
        request.payment_type,
        &request.customer,
        &state.config.currency_code,
    )?;

    info!(
        session = %session,
        items = charge.items.len(),
        payment_type = %charge.payment_type,
        due_now = %charge.total_amount,
        due_later = %charge.remaining_amount,
        "Submitting checkout"
    );

    let response = state.gateway.charge(&charge).await?;

    if !response.success {
        let message = response
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "Payment could not be started".to_string());
        warn!(session = %session, error = %message, "Payment gateway refused checkout");
        return Err(ApiError::payment(message));
    }

    let Some(payment_url) = response.payment_url.filter(|url| !url.trim().is_empty()) else {
        warn!(session = %session, "Payment gateway accepted without a payment URL");
        return Err(ApiError::payment("Payment gateway did not return a payment URL"));
    };

    let store = state.carts.store(&session).await?;
    let remaining = store.update(|live| {
        live.settle(cart.lines());
        Ok(live.item_count())
    })?;
    if remaining == 0 {
        state.carts.clear(&session);
    }
    info!(session = %session, remaining, "Checkout accepted, redirecting to payment page");

    let amounts = CheckoutAmounts::compute(
        charge.subtotal,
        charge.delivery_charge,
        charge.tip_amount,
        charge.payment_type,
    );

    Ok(Json(CheckoutResponse {
        payment_url,
        amounts,
    }))
}
