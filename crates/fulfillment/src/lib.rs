//! Sales order requests and the print-job fulfillment workflow (event-sourced).
//!
//! A request moves through an explicit transition table. No move past intake
//! is allowed until a priced, numbered invoice is linked to it.

pub mod request;
pub mod workflow;

pub use request::{
    CustomerIdentity, DecidePayment, IntakeRequest, InvoiceLinked, LinkInvoice,
    MarkRequestPaid, PaymentDecided, PaymentDecision, RequestCommand, RequestEvent, RequestId,
    RequestIntaken, RequestMarkedPaid, RequestPaymentStatus, RequestTransitioned,
    SalesOrderRequest, TransitionRequest,
};
pub use workflow::{
    FulfillmentStatus, WorkflowAction, next_status, require_linked_invoice,
    require_payment_settled,
};
