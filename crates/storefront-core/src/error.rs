//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Cart / checkout rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP errors (in app)                                                  │
//! │  └── ApiError         - What the storefront frontend sees              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → toast in the browser   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Malformed catalog data is NOT an error here: the variant parser skips it
//! and pricing falls back to the product's base price.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart line cannot be found.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Cart has reached its maximum number of lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A monetary amount is unusable for the requested operation.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These block checkout submission locally; the payment gateway is never
/// contacted while one of these is outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Several required fields are missing or empty.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout form submitted with blank address
    ///      │
    ///      ▼
    /// build_charge_request(...)
    ///      │
    ///      ▼
    /// MissingFields { fields: ["address"] }
    ///      │
    ///      ▼
    /// Toast: "Missing required fields: address"
    /// ```
    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid email, non-numeric tip).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,
}

impl ValidationError {
    /// Names the fields this error is about.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ValidationError::MissingFields { fields } => {
                fields.iter().map(String::as_str).collect()
            }
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => vec![field.as_str()],
            ValidationError::EmptyCart => vec!["cart"],
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityTooLarge {
            requested: 1200,
            max: 999,
        };
        assert_eq!(err.to_string(), "Quantity 1200 exceeds maximum allowed (999)");
    }

    #[test]
    fn test_missing_fields_message_lists_every_field() {
        let err = ValidationError::MissingFields {
            fields: vec!["phone".to_string(), "address".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required fields: phone, address");
        assert_eq!(err.fields(), vec!["phone", "address"]);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::EmptyCart.into();
        assert!(matches!(core_err, CoreError::Validation(ValidationError::EmptyCart)));
    }
}
