//! Recorded payments.
//!
//! A payment row is immutable once written; corrections are new payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use inkworks_accounting::DiscountType;
use inkworks_core::{Amount, Entity, UserId, aggregate_id_type};
use inkworks_sales::OrderId;

use crate::invoice::InvoiceId;

aggregate_id_type!(
    /// Payment row identifier.
    PaymentId
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    pub order_id: Option<OrderId>,
    /// Cash actually received.
    pub amount: Amount,
    pub payment_method: String,
    pub reference_number: String,
    pub notes: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub discount_amount: Amount,
    pub discount_reason: Option<String>,
    pub recorded_by: UserId,
    pub payment_date: DateTime<Utc>,
}

impl Payment {
    /// Amount the invoice balance moves by: cash plus discount.
    pub fn total_credit(&self) -> Amount {
        self.amount + self.discount_amount
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
