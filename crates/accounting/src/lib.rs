//! Reconciliation arithmetic and commissions.
//!
//! - `discount`: per-invoice discount against the outstanding balance.
//! - `recognition`: profit recognized in proportion to collection.
//! - `commission`: staff commissions accrued against an order.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod commission;
pub mod discount;
pub mod recognition;

pub use commission::{
    AccrueCommission, Commission, CommissionAccrued, CommissionCommand, CommissionEvent,
    CommissionId, CommissionSettled, CommissionTotals, CommissionType, PaidStatus,
    SettleCommission,
};
pub use discount::{Discount, DiscountBreakdown, DiscountType, compute_discount};
pub use recognition::{ProfitRecognition, recognize};
