//! # Payment Gateway
//!
//! Sends a charge request to the hosted payment page provider and returns
//! where to redirect the shopper.
//!
//! ```text
//! checkout handler ──► dyn PaymentGateway::charge(&ChargeRequest)
//!                              │
//!                              ├── HttpPaymentGateway: POST JSON, parse ChargeResponse
//!                              └── test doubles (recording, failing, blocking)
//! ```
//!
//! One attempt per checkout. A failed call leaves the cart untouched so the
//! shopper can simply try again.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use storefront_core::{ChargeRequest, ChargeResponse};

/// Payment gateway failures.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway answered but refused the charge. The text is shown as-is.
    #[error("{0}")]
    Rejected(String),

    /// The gateway could not be reached or timed out.
    #[error("Payment gateway unreachable: {0}")]
    Network(String),

    /// The gateway answered with something that is not a charge response.
    #[error("Invalid payment gateway response: {0}")]
    InvalidResponse(String),
}

/// Anything that can turn a charge request into a payment page.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResponse, PaymentError>;
}

/// Gateway reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPaymentGateway {
    /// Creates a gateway client with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        Ok(HttpPaymentGateway {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Endpoint charge requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResponse, PaymentError> {
        debug!(
            endpoint = %self.endpoint,
            items = request.items.len(),
            total = %request.total_amount,
            "Posting charge request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        interpret_reply(status, &body)
    }
}

/// Turns the gateway's HTTP reply into a charge response.
///
/// `success` is only believed on a 2xx status. Error statuses usually still
/// carry a `ChargeResponse` whose message is passed through.
fn interpret_reply(status: StatusCode, body: &str) -> Result<ChargeResponse, PaymentError> {
    let parsed = serde_json::from_str::<ChargeResponse>(body);

    if status.is_success() {
        return parsed.map_err(|e| PaymentError::InvalidResponse(e.to_string()));
    }

    warn!(%status, "Payment gateway returned an error status");
    match parsed {
        Ok(ChargeResponse {
            error: Some(message),
            ..
        }) if !message.trim().is_empty() => Err(PaymentError::Rejected(message)),
        _ => Err(PaymentError::Rejected(format!(
            "Payment gateway returned {}",
            status
        ))),
    }
}
