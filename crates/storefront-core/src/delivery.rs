//! # Delivery Fee
//!
//! Tiered rule: free at or above a subtotal threshold, flat fee below it.
//!
//! ```text
//!   subtotal      1999.00 │ 2000.00 │ 2001.00
//!   delivery fee   100.00 │    0.00 │    0.00
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::{FLAT_DELIVERY_FEE, FREE_DELIVERY_THRESHOLD};

/// Threshold and fee pair; `Default` uses the store-wide constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPolicy {
    pub free_threshold: Money,
    pub flat_fee: Money,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        DeliveryPolicy {
            free_threshold: Money::from_major(FREE_DELIVERY_THRESHOLD),
            flat_fee: Money::from_major(FLAT_DELIVERY_FEE),
        }
    }
}

impl DeliveryPolicy {
    /// Fee owed for a given subtotal.
    pub fn fee_for(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_threshold {
            Money::zero()
        } else {
            self.flat_fee
        }
    }

    /// How much more the shopper must add to qualify for free delivery.
    pub fn remaining_for_free(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_threshold {
            Money::zero()
        } else {
            self.free_threshold - subtotal
        }
    }
}

/// Delivery fee under the default store policy.
pub fn compute_delivery_fee(subtotal: Money) -> Money {
    DeliveryPolicy::default().fee_for(subtotal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(compute_delivery_fee(Money::from_major(1999)), Money::from_major(100));
        assert_eq!(compute_delivery_fee(Money::from_major(2000)), Money::zero());
        assert_eq!(compute_delivery_fee(Money::from_major(2001)), Money::zero());
    }

    #[test]
    fn test_just_below_threshold_in_minor_units() {
        assert_eq!(
            compute_delivery_fee(Money::from_minor(199_999)),
            Money::from_major(100)
        );
    }

    #[test]
    fn test_custom_policy() {
        let policy = DeliveryPolicy {
            free_threshold: Money::from_major(5000),
            flat_fee: Money::from_major(60),
        };
        assert_eq!(policy.fee_for(Money::from_major(4999)), Money::from_major(60));
        assert_eq!(policy.remaining_for_free(Money::from_major(4000)), Money::from_major(1000));
        assert_eq!(policy.remaining_for_free(Money::from_major(6000)), Money::zero());
    }
}
