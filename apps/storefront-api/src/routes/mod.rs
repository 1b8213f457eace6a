//! # Routes Module
//!
//! HTTP handlers grouped by the part of the storefront they serve.
//!
//! ## Endpoint Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    /health                                  liveness               │
//! │                                                                         │
//! │  catalog.rs                                                             │
//! │  GET    /products                                listing cards          │
//! │  GET    /products/{id}/price-info                product page prices    │
//! │                                                                         │
//! │  cart.rs                                                                │
//! │  GET    /cart/{session}                          lines + totals         │
//! │  POST   /cart/{session}/items                    add (price frozen)     │
//! │  PATCH  /cart/{session}/items/{line}             set quantity           │
//! │  DELETE /cart/{session}/items/{line}             remove line            │
//! │  DELETE /cart/{session}                          empty cart             │
//! │                                                                         │
//! │  checkout.rs                                                            │
//! │  POST   /checkout/{session}/quote                live summary           │
//! │  POST   /checkout/{session}                      submit to gateway      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;

use axum::routing::{get, patch, post};
use axum::Router;

use storefront_core::ValidationError;

use crate::state::AppState;

/// Longest accepted session identifier.
const MAX_SESSION_LEN: usize = 128;

/// All routes, ready for `with_state`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(catalog::list_products))
        .route("/products/{id}/price-info", get(catalog::price_info))
        .route("/cart/{session}", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/{session}/items", post(cart::add_item))
        .route(
            "/cart/{session}/items/{line}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/checkout/{session}/quote", post(checkout::quote))
        .route("/checkout/{session}", post(checkout::submit))
}

/// Health check handler.
async fn health() -> &'static str {
    "OK"
}

/// Session ids come from the client; keep them short and path-safe.
pub(crate) fn validate_session(session: &str) -> Result<(), ValidationError> {
    if session.is_empty() || session.len() > MAX_SESSION_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "session".to_string(),
            reason: format!("must be 1-{} characters", MAX_SESSION_LEN),
        });
    }

    if !session
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "session".to_string(),
            reason: "only letters, digits, '-' and '_' are allowed".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_session() {
        assert!(validate_session("a1b2-c3_d4").is_ok());
        assert!(validate_session("").is_err());
        assert!(validate_session("../etc").is_err());
        assert!(validate_session(&"x".repeat(MAX_SESSION_LEN + 1)).is_err());
    }
}
