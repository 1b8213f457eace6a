//! # Payment Split
//!
//! Full payment charges everything now. Partial payment charges a fixed
//! share now and the rest on delivery.
//!
//! ```text
//!   total 1200.00, partial  →  due now 240.00  |  due on delivery 960.00
//!   total 1999.99, partial  →  due now 400.00  |  due on delivery 1599.99
//!                                   round(20%)     total - due now
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::PARTIAL_PAYMENT_BPS;

/// How much of the order the shopper pays up front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Everything now.
    #[default]
    Full,
    /// A fixed share now, the rest cash on delivery.
    Partial,
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentType::Full => write!(f, "full"),
            PaymentType::Partial => write!(f, "partial"),
        }
    }
}

impl FromStr for PaymentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(PaymentType::Full),
            "partial" => Ok(PaymentType::Partial),
            other => Err(ValidationError::InvalidFormat {
                field: "paymentType".to_string(),
                reason: format!("unknown payment type '{}', expected full or partial", other),
            }),
        }
    }
}

/// Amount charged now and amount collected on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSplit {
    pub due_now: Money,
    pub due_later: Money,
}

/// Splits an order total by payment type.
///
/// `due_later` is always `total - due_now`, so the two parts sum exactly to
/// the total regardless of rounding.
pub fn compute_split(total: Money, payment_type: PaymentType) -> PaymentSplit {
    match payment_type {
        PaymentType::Full => PaymentSplit {
            due_now: total,
            due_later: Money::zero(),
        },
        PaymentType::Partial => {
            let due_now = total.percentage_bps(PARTIAL_PAYMENT_BPS);
            PaymentSplit {
                due_now,
                due_later: total - due_now,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payment() {
        let split = compute_split(Money::from_major(2500), PaymentType::Full);
        assert_eq!(split.due_now, Money::from_major(2500));
        assert_eq!(split.due_later, Money::zero());
    }

    #[test]
    fn test_partial_payment() {
        let split = compute_split(Money::from_major(1200), PaymentType::Partial);
        assert_eq!(split.due_now, Money::from_major(240));
        assert_eq!(split.due_later, Money::from_major(960));
    }

    #[test]
    fn test_partial_split_always_sums_to_total() {
        for minor in [0, 1, 2, 3, 7, 99, 199_900, 199_999, 123_457, 1_000_001] {
            let total = Money::from_minor(minor);
            let split = compute_split(total, PaymentType::Partial);
            assert_eq!(split.due_now + split.due_later, total, "total {}", minor);
        }
    }

    #[test]
    fn test_partial_rounding() {
        // 20% of 1999.99 = 399.998 → 400.00
        let split = compute_split(Money::from_minor(199_999), PaymentType::Partial);
        assert_eq!(split.due_now, Money::from_minor(40_000));
        assert_eq!(split.due_later, Money::from_minor(159_999));
    }

    #[test]
    fn test_payment_type_parsing() {
        assert_eq!("full".parse::<PaymentType>().unwrap(), PaymentType::Full);
        assert_eq!(" Partial ".parse::<PaymentType>().unwrap(), PaymentType::Partial);
        assert!("cod".parse::<PaymentType>().is_err());
        assert_eq!(PaymentType::Partial.to_string(), "partial");
    }

    #[test]
    fn test_payment_type_serde() {
        let json = serde_json::to_string(&PaymentType::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}
