//! Invoices: pricing, lifecycle, payment application and profit summaries.
//!
//! Pure domain logic only (no IO, no HTTP, no storage). Anything an invoice
//! needs from the outside world (stock levels, whether a number is already
//! taken) is resolved by the caller and carried in the command.

pub mod invoice;
pub mod item;
pub mod payment;
pub mod summary;

pub use invoice::{
    ActivateInvoice, ApplyPayment, CreateDraftInvoice, DEFAULT_DRAFT_PREFIX, DraftInvoiceCreated,
    Invoice, InvoiceActivated, InvoiceCommand, InvoiceEvent, InvoiceId, InvoiceItemsReplaced,
    InvoiceRecord, InvoiceStatus, PaymentApplied, PaymentDetails, ReplaceInvoiceItems,
    is_placeholder_number,
};
pub use item::{Dimensions, InvoiceItem, ItemInput, SaleType, price_item, price_items};
pub use payment::{Payment, PaymentId};
pub use summary::{CustomerStatement, FinancialSummary, InvoiceProfit};
