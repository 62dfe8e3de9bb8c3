use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use inkworks_accounting::Commission;
use inkworks_core::{AggregateRoot, Amount, UserId};
use inkworks_fulfillment::{FulfillmentStatus, PaymentDecision, SalesOrderRequest};
use inkworks_invoicing::{Invoice, InvoiceId, ItemInput};
use inkworks_parties::{ContactInfo, Customer, CustomerId};
use inkworks_sales::Order;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterCustomerRequest {
    pub name: String,
    pub contact: Option<ContactInfo>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub contact: Option<ContactInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub description: String,
    pub total_amount: Amount,
}

#[derive(Debug, Deserialize)]
pub struct ActivateInvoiceRequest {
    pub number: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceItemsRequest {
    pub items: Vec<ItemInput>,
    #[serde(default)]
    pub tax_amount: Amount,
}

#[derive(Debug, Deserialize)]
pub struct SettleCommissionRequest {
    pub actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct CommissionTotalsQuery {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequestBody {
    pub target_status: FulfillmentStatus,
    pub actor_id: UserId,
    pub assignee: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct LinkInvoiceRequest {
    pub invoice_id: InvoiceId,
}

#[derive(Debug, Deserialize)]
pub struct PaymentDecisionRequest {
    pub decision: PaymentDecision,
    pub actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub stock_quantity: i64,
}

// -------------------------
// Response mapping
// -------------------------

pub fn customer_to_json(c: &Customer) -> JsonValue {
    json!({
        "id": c.id_typed().to_string(),
        "name": c.name(),
        "contact": c.contact(),
        "created_at": c.created_at(),
        "version": c.version(),
    })
}

pub fn order_to_json(o: &Order) -> JsonValue {
    json!({
        "id": o.id_typed().to_string(),
        "customer_id": o.customer_id().map(|id| id.to_string()),
        "description": o.description(),
        "total_amount": o.total_amount(),
        "amount_paid": o.amount_paid(),
        "payment_status": o.payment_status(),
        "created_at": o.created_at(),
        "version": o.version(),
    })
}

pub fn invoice_to_json(i: &Invoice) -> JsonValue {
    json!(i.to_record())
}

pub fn commission_to_json(c: &Commission) -> JsonValue {
    json!({
        "id": c.id_typed().to_string(),
        "order_id": c.order_id().map(|id| id.to_string()),
        "user_id": c.user_id().map(|id| id.to_string()),
        "commission_type": c.commission_type(),
        "commission_percentage": c.commission_percentage(),
        "base_amount": c.base_amount(),
        "commission_amount": c.commission_amount(),
        "paid_status": c.paid_status(),
        "accrued_at": c.accrued_at(),
        "paid_at": c.paid_at(),
        "paid_by": c.paid_by().map(|id| id.to_string()),
    })
}

pub fn request_to_json(r: &SalesOrderRequest) -> JsonValue {
    json!({
        "id": r.id_typed().to_string(),
        "customer": r.customer(),
        "description": r.description(),
        "notes": r.notes(),
        "status": r.status(),
        "linked_invoice_id": r.linked_invoice_id().map(|id| id.to_string()),
        "payment_status": r.payment_status(),
        "designer_id": r.designer_id().map(|id| id.to_string()),
        "print_operator_id": r.print_operator_id().map(|id| id.to_string()),
        "processed_at": r.processed_at(),
        "created_at": r.created_at(),
        "version": r.version(),
    })
}
