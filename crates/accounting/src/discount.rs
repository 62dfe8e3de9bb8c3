//! Discounts applied while allocating a payment to one invoice.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use inkworks_core::{Amount, DomainError, DomainResult, ValueObject};
use inkworks_core::money::{round_minor, to_amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `value` is an amount in minor units.
    #[default]
    Fixed,
    /// `value` is a percentage of the outstanding balance, `0..=100`.
    Percentage,
}

/// A discount as entered by staff.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Discount {
    #[serde(rename = "type", default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub value: Decimal,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ValueObject for Discount {}

impl Discount {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn fixed(value: Amount) -> Self {
        Self {
            discount_type: DiscountType::Fixed,
            value: Decimal::from(value),
            reason: None,
        }
    }

    pub fn percentage(value: Decimal) -> Self {
        Self {
            discount_type: DiscountType::Percentage,
            value,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.value < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "discount value must not be negative, got {}",
                self.value
            )));
        }
        if self.discount_type == DiscountType::Percentage && self.value > Decimal::ONE_HUNDRED {
            return Err(DomainError::validation(format!(
                "percentage discount must be at most 100, got {}",
                self.value
            )));
        }
        Ok(())
    }
}

/// Result of applying a discount to an outstanding balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountBreakdown {
    pub outstanding: Amount,
    pub discount_amount: Amount,
    pub payable_after_discount: Amount,
}

/// Compute the discount amount against `outstanding` and what is left to pay.
///
/// The discount is clamped to `[0, outstanding]`, so the payable amount never
/// goes negative.
pub fn compute_discount(outstanding: Amount, discount: &Discount) -> DomainResult<DiscountBreakdown> {
    discount.validate()?;

    let raw = match discount.discount_type {
        DiscountType::Fixed => round_minor(discount.value),
        DiscountType::Percentage => {
            round_minor(Decimal::from(outstanding) * discount.value / Decimal::ONE_HUNDRED)
        }
    };
    // Anything beyond the balance is clamped, so out-of-range values never
    // reach the u64 conversion.
    let clamped = raw.min(Decimal::from(outstanding));
    let discount_amount = to_amount(clamped, "discount_amount")?;

    Ok(DiscountBreakdown {
        outstanding,
        discount_amount,
        payable_after_discount: outstanding.saturating_sub(discount_amount),
    })
}
