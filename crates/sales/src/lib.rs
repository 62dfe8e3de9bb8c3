//! Print job orders (event-sourced).
//!
//! An order is the job a customer commissioned. Its payment fields mirror the
//! credit applied to the invoice billing it, and commissions hang off it.

pub mod order;

pub use order::{
    CreateOrder, Order, OrderCommand, OrderCreated, OrderEvent, OrderId, OrderPaymentRecorded,
    OrderPaymentStatus, RecordOrderPayment,
};
