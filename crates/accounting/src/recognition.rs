//! Profit recognized in proportion to how much of an invoice was collected.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use inkworks_core::money::{ratio, round_minor};
use inkworks_core::{Amount, SignedAmount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitRecognition {
    pub invoice_profit: SignedAmount,
    /// `min(amount_paid / total_amount, 1)`, zero for a zero total.
    pub payment_ratio: Decimal,
    pub recognized_profit: SignedAmount,
    pub pending_profit: SignedAmount,
}

/// Split `invoice_profit` into recognized and pending parts.
///
/// Recognized profit is rounded to the minor unit; pending is the exact
/// remainder, so the two always add back up to `invoice_profit`.
pub fn recognize(
    invoice_profit: SignedAmount,
    amount_paid: Amount,
    total_amount: Amount,
) -> ProfitRecognition {
    let payment_ratio = ratio(amount_paid, total_amount);
    let recognized = round_minor(Decimal::from(invoice_profit) * payment_ratio);
    // |recognized| <= |invoice_profit| because the ratio is clamped to [0, 1].
    let recognized_profit = recognized.to_i64().unwrap_or(invoice_profit);

    ProfitRecognition {
        invoice_profit,
        payment_ratio,
        recognized_profit,
        pending_profit: invoice_profit - recognized_profit,
    }
}
