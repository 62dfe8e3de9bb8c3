use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkworks_accounting::{Discount, ProfitRecognition, compute_discount, recognize};
use inkworks_core::{
    Aggregate, AggregateRoot, Amount, DomainError, SignedAmount, UserId, aggregate_id_type,
};
use inkworks_events::Event;
use inkworks_inventory::{StockSnapshot, check_availability};
use inkworks_parties::CustomerId;
use inkworks_sales::OrderId;

use crate::item::{InvoiceItem, ItemInput, price_items};
use crate::payment::{Payment, PaymentId};

aggregate_id_type!(
    /// Invoice identifier.
    InvoiceId
);

pub const DEFAULT_DRAFT_PREFIX: &str = "DRAFT-";

const PENDING_NUMBER: &str = "PENDING";

/// Whether `number` is a stand-in rather than a real invoice number.
///
/// Empty strings, `PENDING` and anything carrying a draft prefix all mean
/// "not numbered yet".
pub fn is_placeholder_number(number: &str, draft_prefix: &str) -> bool {
    let number = number.trim();
    number.is_empty()
        || number.eq_ignore_ascii_case(PENDING_NUMBER)
        || number.starts_with(DEFAULT_DRAFT_PREFIX)
        || (!draft_prefix.is_empty() && number.starts_with(draft_prefix))
}

/// Payment coverage of an invoice. Never stored; see [`Invoice::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Unpaid,
    PartiallyPaid,
    Paid,
}

/// Aggregate root: Invoice.
///
/// `amount_paid` only ever grows and never exceeds `total_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    customer_id: Option<CustomerId>,
    order_id: Option<OrderId>,
    number: Option<String>,
    draft_prefix: String,
    is_draft: bool,
    items: Vec<InvoiceItem>,
    subtotal: Amount,
    tax_amount: Amount,
    total_amount: Amount,
    amount_paid: Amount,
    payments: Vec<Payment>,
    created_at: Option<DateTime<Utc>>,
    activated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            customer_id: None,
            order_id: None,
            number: None,
            draft_prefix: DEFAULT_DRAFT_PREFIX.to_string(),
            is_draft: true,
            items: Vec::new(),
            subtotal: 0,
            tax_amount: 0,
            total_amount: 0,
            amount_paid: 0,
            payments: Vec::new(),
            created_at: None,
            activated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    pub fn is_draft(&self) -> bool {
        self.is_draft
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Activated and carrying a real (non-placeholder) number.
    pub fn has_real_number(&self) -> bool {
        !self.is_draft
            && self
                .number
                .as_deref()
                .is_some_and(|n| !is_placeholder_number(n, &self.draft_prefix))
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn subtotal(&self) -> Amount {
        self.subtotal
    }

    pub fn tax_amount(&self) -> Amount {
        self.tax_amount
    }

    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    pub fn amount_paid(&self) -> Amount {
        self.amount_paid
    }

    pub fn balance(&self) -> Amount {
        self.total_amount.saturating_sub(self.amount_paid)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    /// Derived from payment coverage on every call.
    ///
    /// A non-draft invoice with a zero total counts as paid.
    pub fn status(&self) -> InvoiceStatus {
        if self.is_draft {
            InvoiceStatus::Draft
        } else if self.amount_paid >= self.total_amount {
            InvoiceStatus::Paid
        } else if self.amount_paid > 0 {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Unpaid
        }
    }

    /// Item lists are refused at write time when their profit overflows.
    pub fn invoice_profit(&self) -> SignedAmount {
        self.items
            .iter()
            .fold(0i64, |acc, i| acc.saturating_add(i.line_profit))
    }

    pub fn profit(&self) -> ProfitRecognition {
        recognize(self.invoice_profit(), self.amount_paid, self.total_amount)
    }

    /// External representation, with the derived status filled in.
    pub fn to_record(&self) -> InvoiceRecord {
        InvoiceRecord {
            id: self.id,
            customer_id: self.customer_id,
            order_id: self.order_id,
            number: self.number.clone(),
            is_draft: self.is_draft,
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
            balance: self.balance(),
            status: self.status(),
            items: self.items.clone(),
            payments: self.payments.clone(),
            created_at: self.created_at,
            activated_at: self.activated_at,
            version: self.version,
        }
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Read-side view of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    pub customer_id: Option<CustomerId>,
    pub order_id: Option<OrderId>,
    pub number: Option<String>,
    pub is_draft: bool,
    pub subtotal: Amount,
    pub tax_amount: Amount,
    pub total_amount: Amount,
    pub amount_paid: Amount,
    pub balance: Amount,
    pub status: InvoiceStatus,
    pub items: Vec<InvoiceItem>,
    pub payments: Vec<Payment>,
    pub created_at: Option<DateTime<Utc>>,
    pub activated_at: Option<DateTime<Utc>>,
    pub version: u64,
}

/// Command: CreateDraftInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDraftInvoice {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub order_id: Option<OrderId>,
    pub items: Vec<ItemInput>,
    pub tax_amount: Amount,
    pub draft_prefix: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ActivateInvoice.
///
/// The caller has already established that `number` is not used by another
/// active invoice and captured stock for the invoice's catalog products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateInvoice {
    pub invoice_id: InvoiceId,
    pub number: String,
    pub stock: StockSnapshot,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReplaceInvoiceItems (full delete + reinsert of the item set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceInvoiceItems {
    pub invoice_id: InvoiceId,
    pub items: Vec<ItemInput>,
    pub tax_amount: Amount,
    /// Consulted only when the invoice is active.
    pub stock: StockSnapshot,
    pub occurred_at: DateTime<Utc>,
}

/// Who recorded a payment and how it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment_method: String,
    pub reference_number: String,
    pub notes: Option<String>,
    pub recorded_by: UserId,
}

/// Command: ApplyPayment (one allocation of a customer payment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyPayment {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub payment_id: PaymentId,
    pub amount_received: Amount,
    pub discount: Discount,
    pub details: PaymentDetails,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    CreateDraftInvoice(CreateDraftInvoice),
    ActivateInvoice(ActivateInvoice),
    ReplaceInvoiceItems(ReplaceInvoiceItems),
    ApplyPayment(ApplyPayment),
}

/// Event: DraftInvoiceCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftInvoiceCreated {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub order_id: Option<OrderId>,
    pub number: String,
    pub draft_prefix: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Amount,
    pub tax_amount: Amount,
    pub total_amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceActivated {
    pub invoice_id: InvoiceId,
    pub number: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceItemsReplaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItemsReplaced {
    pub invoice_id: InvoiceId,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Amount,
    pub tax_amount: Amount,
    pub total_amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentApplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApplied {
    pub invoice_id: InvoiceId,
    pub payment: Payment,
    pub total_credit: Amount,
    pub new_amount_paid: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    DraftInvoiceCreated(DraftInvoiceCreated),
    InvoiceActivated(InvoiceActivated),
    InvoiceItemsReplaced(InvoiceItemsReplaced),
    PaymentApplied(PaymentApplied),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::DraftInvoiceCreated(_) => "invoicing.invoice.draft_created",
            InvoiceEvent::InvoiceActivated(_) => "invoicing.invoice.activated",
            InvoiceEvent::InvoiceItemsReplaced(_) => "invoicing.invoice.items_replaced",
            InvoiceEvent::PaymentApplied(_) => "invoicing.invoice.payment_applied",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::DraftInvoiceCreated(e) => e.occurred_at,
            InvoiceEvent::InvoiceActivated(e) => e.occurred_at,
            InvoiceEvent::InvoiceItemsReplaced(e) => e.occurred_at,
            InvoiceEvent::PaymentApplied(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::DraftInvoiceCreated(e) => {
                self.id = e.invoice_id;
                self.customer_id = Some(e.customer_id);
                self.order_id = e.order_id;
                self.number = Some(e.number.clone());
                self.draft_prefix = e.draft_prefix.clone();
                self.is_draft = true;
                self.items = e.items.clone();
                self.subtotal = e.subtotal;
                self.tax_amount = e.tax_amount;
                self.total_amount = e.total_amount;
                self.amount_paid = 0;
                self.payments.clear();
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            InvoiceEvent::InvoiceActivated(e) => {
                self.number = Some(e.number.clone());
                self.is_draft = false;
                self.activated_at = Some(e.occurred_at);
            }
            InvoiceEvent::InvoiceItemsReplaced(e) => {
                self.items = e.items.clone();
                self.subtotal = e.subtotal;
                self.tax_amount = e.tax_amount;
                self.total_amount = e.total_amount;
            }
            InvoiceEvent::PaymentApplied(e) => {
                self.amount_paid = e.new_amount_paid;
                self.payments.push(e.payment.clone());
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::CreateDraftInvoice(cmd) => self.handle_create_draft(cmd),
            InvoiceCommand::ActivateInvoice(cmd) => self.handle_activate(cmd),
            InvoiceCommand::ReplaceInvoiceItems(cmd) => self.handle_replace_items(cmd),
            InvoiceCommand::ApplyPayment(cmd) => self.handle_apply_payment(cmd),
        }
    }
}

struct Totals {
    subtotal: Amount,
    total_amount: Amount,
}

fn totals(items: &[InvoiceItem], tax_amount: Amount) -> Result<Totals, DomainError> {
    let subtotal = items.iter().try_fold(0u64, |acc, i| {
        acc.checked_add(i.amount)
            .ok_or_else(|| DomainError::validation("invoice subtotal overflow"))
    })?;
    let total_amount = subtotal
        .checked_add(tax_amount)
        .ok_or_else(|| DomainError::validation("invoice total overflow"))?;
    items.iter().try_fold(0i64, |acc, i| {
        acc.checked_add(i.line_profit)
            .ok_or_else(|| DomainError::validation("invoice profit overflow"))
    })?;
    Ok(Totals {
        subtotal,
        total_amount,
    })
}

fn ensure_stock(items: &[InvoiceItem], stock: &StockSnapshot) -> Result<(), DomainError> {
    check_availability(
        items
            .iter()
            .filter_map(|i| i.product_id.as_ref().map(|p| (p, i.quantity))),
        stock,
    )
}

fn placeholder_for(invoice_id: InvoiceId, draft_prefix: &str) -> String {
    let hex = invoice_id.0.as_uuid().simple().to_string();
    // The tail of a v7 uuid is random; the head is a timestamp.
    let tail = &hex[hex.len() - 8..];
    format!("{draft_prefix}{}", tail.to_ascii_uppercase())
}

impl Invoice {
    fn ensure_invoice_id(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if self.id != invoice_id {
            return Err(DomainError::precondition("invoice_id mismatch"));
        }
        Ok(())
    }

    fn ensure_exists(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_invoice_id(invoice_id)
    }

    fn handle_create_draft(
        &self,
        cmd: &CreateDraftInvoice,
    ) -> Result<Vec<InvoiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("invoice already exists"));
        }
        if cmd.draft_prefix.trim().is_empty() {
            return Err(DomainError::validation("draft prefix cannot be empty"));
        }

        let items = price_items(&cmd.items)?;
        let t = totals(&items, cmd.tax_amount)?;

        Ok(vec![InvoiceEvent::DraftInvoiceCreated(DraftInvoiceCreated {
            invoice_id: cmd.invoice_id,
            customer_id: cmd.customer_id,
            order_id: cmd.order_id,
            number: placeholder_for(cmd.invoice_id, &cmd.draft_prefix),
            draft_prefix: cmd.draft_prefix.clone(),
            items,
            subtotal: t.subtotal,
            tax_amount: cmd.tax_amount,
            total_amount: t.total_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_activate(&self, cmd: &ActivateInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_exists(cmd.invoice_id)?;

        if !self.is_draft {
            return Err(DomainError::conflict("invoice is already active"));
        }
        if is_placeholder_number(&cmd.number, &self.draft_prefix) {
            return Err(DomainError::validation(format!(
                "'{}' is not a real invoice number",
                cmd.number.trim()
            )));
        }
        if self.items.is_empty() {
            return Err(DomainError::precondition(
                "cannot activate an invoice without items",
            ));
        }
        ensure_stock(&self.items, &cmd.stock)?;

        Ok(vec![InvoiceEvent::InvoiceActivated(InvoiceActivated {
            invoice_id: cmd.invoice_id,
            number: cmd.number.trim().to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_replace_items(
        &self,
        cmd: &ReplaceInvoiceItems,
    ) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_exists(cmd.invoice_id)?;

        let items = price_items(&cmd.items)?;
        let t = totals(&items, cmd.tax_amount)?;

        if !self.is_draft {
            if items.is_empty() {
                return Err(DomainError::precondition(
                    "an active invoice must keep at least one item",
                ));
            }
            ensure_stock(&items, &cmd.stock)?;
        }

        if t.total_amount < self.amount_paid {
            return Err(DomainError::precondition(format!(
                "new total {} is below the {} already collected; record a refund or credit first",
                t.total_amount, self.amount_paid
            )));
        }

        Ok(vec![InvoiceEvent::InvoiceItemsReplaced(InvoiceItemsReplaced {
            invoice_id: cmd.invoice_id,
            items,
            subtotal: t.subtotal,
            tax_amount: cmd.tax_amount,
            total_amount: t.total_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_apply_payment(&self, cmd: &ApplyPayment) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_exists(cmd.invoice_id)?;

        if self.customer_id != Some(cmd.customer_id) {
            return Err(DomainError::precondition(
                "invoice belongs to another customer",
            ));
        }
        if self.is_draft {
            return Err(DomainError::precondition("invoice is still a draft"));
        }
        if self.status() == InvoiceStatus::Paid {
            return Err(DomainError::precondition("invoice already paid"));
        }

        let method = cmd.details.payment_method.trim();
        let reference = cmd.details.reference_number.trim();
        if method.is_empty() {
            return Err(DomainError::validation("payment_method cannot be empty"));
        }
        if reference.is_empty() {
            return Err(DomainError::validation("reference_number cannot be empty"));
        }

        let breakdown = compute_discount(self.balance(), &cmd.discount)?;
        if cmd.amount_received > breakdown.payable_after_discount {
            return Err(DomainError::validation(format!(
                "amount {} exceeds payable after discount {}",
                cmd.amount_received, breakdown.payable_after_discount
            )));
        }

        let total_credit = cmd.amount_received + breakdown.discount_amount;
        if total_credit == 0 {
            return Err(DomainError::validation(
                "allocation neither receives cash nor grants a discount",
            ));
        }
        let new_amount_paid = self.amount_paid + total_credit;

        let payment = Payment {
            id: cmd.payment_id,
            invoice_id: cmd.invoice_id,
            order_id: self.order_id,
            amount: cmd.amount_received,
            payment_method: method.to_string(),
            reference_number: reference.to_string(),
            notes: cmd.details.notes.clone(),
            discount_type: cmd.discount.discount_type,
            discount_value: cmd.discount.value,
            discount_amount: breakdown.discount_amount,
            discount_reason: cmd.discount.reason.clone(),
            recorded_by: cmd.details.recorded_by,
            payment_date: cmd.occurred_at,
        };

        Ok(vec![InvoiceEvent::PaymentApplied(PaymentApplied {
            invoice_id: cmd.invoice_id,
            payment,
            total_credit,
            new_amount_paid,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkworks_events::execute;
    use inkworks_inventory::{ProductId, StockLevel};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn details() -> PaymentDetails {
        PaymentDetails {
            payment_method: "cash".to_string(),
            reference_number: "R-1".to_string(),
            notes: None,
            recorded_by: UserId::new(),
        }
    }

    fn draft(customer_id: CustomerId, items: Vec<ItemInput>, tax: Amount) -> Invoice {
        let invoice_id = InvoiceId::generate();
        let mut invoice = Invoice::empty(invoice_id);
        let invoice_id = invoice.id_typed();
        execute(
            &mut invoice,
            &InvoiceCommand::CreateDraftInvoice(CreateDraftInvoice {
                invoice_id,
                customer_id,
                order_id: None,
                items,
                tax_amount: tax,
                draft_prefix: DEFAULT_DRAFT_PREFIX.to_string(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        invoice
    }

    fn activate(invoice: &mut Invoice, number: &str) -> Result<Vec<InvoiceEvent>, DomainError> {
        let invoice_id = invoice.id_typed();
        execute(
            invoice,
            &InvoiceCommand::ActivateInvoice(ActivateInvoice {
                invoice_id,
                number: number.to_string(),
                stock: StockSnapshot::default(),
                occurred_at: test_time(),
            }),
        )
    }

    /// Active invoice with a total of exactly `total`.
    fn active_invoice(customer_id: CustomerId, total: Amount) -> Invoice {
        let mut invoice = draft(customer_id, vec![ItemInput::unit("Print run", 1, total)], 0);
        activate(&mut invoice, "INV-0001").unwrap();
        invoice
    }

    fn pay(
        invoice: &mut Invoice,
        customer_id: CustomerId,
        amount: Amount,
        discount: Discount,
    ) -> Result<Vec<InvoiceEvent>, DomainError> {
        let invoice_id = invoice.id_typed();
        execute(
            invoice,
            &InvoiceCommand::ApplyPayment(ApplyPayment {
                invoice_id,
                customer_id,
                payment_id: PaymentId::generate(),
                amount_received: amount,
                discount,
                details: details(),
                occurred_at: test_time(),
            }),
        )
    }

    #[test]
    fn draft_gets_placeholder_number_and_draft_status() {
        let invoice = draft(CustomerId::generate(), vec![ItemInput::unit("Flyers", 10, 5)], 7);

        let number = invoice.number().unwrap();
        assert!(number.starts_with("DRAFT-"));
        assert_eq!(number.len(), "DRAFT-".len() + 8);
        assert!(is_placeholder_number(number, DEFAULT_DRAFT_PREFIX));
        assert!(!invoice.has_real_number());
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
        assert_eq!(invoice.subtotal(), 50);
        assert_eq!(invoice.total_amount(), 57);
    }

    #[test]
    fn items_whose_profit_overflows_are_refused() {
        let invoice_id = InvoiceId::generate();
        let mut invoice = Invoice::empty(invoice_id);
        let half = i64::MAX as Amount;
        let err = execute(
            &mut invoice,
            &InvoiceCommand::CreateDraftInvoice(CreateDraftInvoice {
                invoice_id,
                customer_id: CustomerId::generate(),
                order_id: None,
                items: vec![ItemInput::unit("Wall", 1, half), ItemInput::unit("Wall", 1, half)],
                tax_amount: 0,
                draft_prefix: DEFAULT_DRAFT_PREFIX.to_string(),
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("profit")));
        assert!(!invoice.is_created());
    }

    #[test]
    fn placeholder_numbers_are_recognized() {
        for n in ["", "   ", "PENDING", "pending", "DRAFT-1A2B3C4D", "TMP-9"] {
            assert!(is_placeholder_number(n, "TMP-"), "{n:?} should be a placeholder");
        }
        assert!(!is_placeholder_number("INV-2031", "TMP-"));
    }

    #[test]
    fn activation_assigns_number_and_clears_draft_flag() {
        let mut invoice = draft(CustomerId::generate(), vec![ItemInput::unit("Flyers", 1, 100)], 0);
        activate(&mut invoice, " INV-7 ").unwrap();

        assert!(!invoice.is_draft());
        assert_eq!(invoice.number(), Some("INV-7"));
        assert!(invoice.has_real_number());
        assert_eq!(invoice.status(), InvoiceStatus::Unpaid);
        assert!(invoice.activated_at().is_some());
    }

    #[test]
    fn activation_rejects_placeholder_number() {
        let mut invoice = draft(CustomerId::generate(), vec![ItemInput::unit("Flyers", 1, 100)], 0);
        for n in ["", "PENDING", "DRAFT-00000000"] {
            let err = activate(&mut invoice, n).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{n:?}");
        }
        assert!(invoice.is_draft());
    }

    #[test]
    fn activation_requires_items() {
        let mut invoice = draft(CustomerId::generate(), vec![], 0);
        match activate(&mut invoice, "INV-1").unwrap_err() {
            DomainError::PreconditionFailed(msg) if msg.contains("without items") => {}
            other => panic!("Expected PreconditionFailed, got {other:?}"),
        }
    }

    #[test]
    fn activation_is_blocked_by_insufficient_stock() {
        let paper = ProductId::new("paper-a4").unwrap();
        let mut invoice = draft(
            CustomerId::generate(),
            vec![
                ItemInput::unit("A4 flyers", 300, 2).with_product(paper.clone()),
                ItemInput::unit("A4 menus", 300, 4).with_product(paper.clone()),
            ],
            0,
        );

        let invoice_id = invoice.id_typed();
        let err = execute(
            &mut invoice,
            &InvoiceCommand::ActivateInvoice(ActivateInvoice {
                invoice_id,
                number: "INV-9".to_string(),
                stock: StockSnapshot::from_levels([StockLevel {
                    product_id: paper,
                    stock_quantity: 500,
                }]),
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();

        assert_eq!(
            err,
            DomainError::InsufficientStock {
                product_id: "paper-a4".to_string(),
                requested: 600,
                available: 500,
            }
        );
        assert!(invoice.is_draft());
    }

    #[test]
    fn activating_twice_is_a_conflict() {
        let mut invoice = active_invoice(CustomerId::generate(), 100);
        assert!(matches!(
            activate(&mut invoice, "INV-2").unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[test]
    fn fixed_discount_allocation_scenario() {
        let customer = CustomerId::generate();
        let mut invoice = active_invoice(customer, 100);

        let events = pay(&mut invoice, customer, 40, Discount::fixed(10)).unwrap();

        assert_eq!(invoice.amount_paid(), 50);
        assert_eq!(invoice.status(), InvoiceStatus::PartiallyPaid);
        match &events[0] {
            InvoiceEvent::PaymentApplied(e) => {
                assert_eq!(e.payment.discount_amount, 10);
                assert_eq!(e.total_credit, 50);
                assert_eq!(e.new_amount_paid, 50);
            }
            _ => panic!("Expected PaymentApplied event"),
        }
        assert_eq!(invoice.payments().len(), 1);
    }

    #[test]
    fn settling_the_balance_marks_paid_and_blocks_further_payments() {
        let customer = CustomerId::generate();
        let mut invoice = active_invoice(customer, 100);
        pay(&mut invoice, customer, 50, Discount::none()).unwrap();

        pay(&mut invoice, customer, 50, Discount::percentage(dec!(0))).unwrap();
        assert_eq!(invoice.amount_paid(), 100);
        assert_eq!(invoice.status(), InvoiceStatus::Paid);

        match pay(&mut invoice, customer, 1, Discount::none()).unwrap_err() {
            DomainError::PreconditionFailed(msg) if msg.contains("already paid") => {}
            other => panic!("Expected PreconditionFailed, got {other:?}"),
        }
    }

    #[test]
    fn payment_above_payable_after_discount_is_rejected() {
        let customer = CustomerId::generate();
        let mut invoice = active_invoice(customer, 100);

        let err = pay(&mut invoice, customer, 95, Discount::fixed(10)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("exceeds")));
        assert_eq!(invoice.amount_paid(), 0);
    }

    #[test]
    fn payment_is_refused_on_drafts_and_other_customers_invoices() {
        let customer = CustomerId::generate();
        let mut d = draft(customer, vec![ItemInput::unit("X", 1, 10)], 0);
        assert!(matches!(
            pay(&mut d, customer, 5, Discount::none()).unwrap_err(),
            DomainError::PreconditionFailed(msg) if msg.contains("draft")
        ));

        let mut invoice = active_invoice(customer, 100);
        assert!(matches!(
            pay(&mut invoice, CustomerId::generate(), 5, Discount::none()).unwrap_err(),
            DomainError::PreconditionFailed(msg) if msg.contains("another customer")
        ));
    }

    #[test]
    fn payment_requires_method_and_reference() {
        let customer = CustomerId::generate();
        let mut invoice = active_invoice(customer, 100);
        let invoice_id = invoice.id_typed();
        let err = execute(
            &mut invoice,
            &InvoiceCommand::ApplyPayment(ApplyPayment {
                invoice_id,
                customer_id: customer,
                payment_id: PaymentId::generate(),
                amount_received: 10,
                discount: Discount::none(),
                details: PaymentDetails {
                    reference_number: "  ".to_string(),
                    ..details()
                },
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("reference_number")));
    }

    #[test]
    fn replacing_items_recomputes_totals_and_keeps_amount_paid() {
        let customer = CustomerId::generate();
        let mut invoice = active_invoice(customer, 100);
        pay(&mut invoice, customer, 30, Discount::none()).unwrap();

        let invoice_id = invoice.id_typed();
        execute(
            &mut invoice,
            &InvoiceCommand::ReplaceInvoiceItems(ReplaceInvoiceItems {
                invoice_id,
                items: vec![
                    ItemInput::unit("Print run", 1, 100),
                    ItemInput::area("Banner", dec!(2), dec!(1.5), 3, 10),
                ],
                tax_amount: 10,
                stock: StockSnapshot::default(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        assert_eq!(invoice.subtotal(), 190);
        assert_eq!(invoice.total_amount(), 200);
        assert_eq!(invoice.amount_paid(), 30);
        assert_eq!(invoice.items().len(), 2);
    }

    #[test]
    fn shrinking_below_collected_amount_is_refused() {
        let customer = CustomerId::generate();
        let mut invoice = active_invoice(customer, 100);
        pay(&mut invoice, customer, 80, Discount::none()).unwrap();
        let before = invoice.clone();

        let invoice_id = invoice.id_typed();
        let err = execute(
            &mut invoice,
            &InvoiceCommand::ReplaceInvoiceItems(ReplaceInvoiceItems {
                invoice_id,
                items: vec![ItemInput::unit("Smaller run", 1, 50)],
                tax_amount: 0,
                stock: StockSnapshot::default(),
                occurred_at: test_time(),
            }),
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::PreconditionFailed(msg) if msg.contains("refund")));
        assert_eq!(invoice, before);
    }

    #[test]
    fn editing_an_active_invoice_rechecks_stock_but_drafts_do_not() {
        let ink = ProductId::new("ink-cyan").unwrap();
        let items = vec![ItemInput::unit("Cyan refill", 5, 20).with_product(ink)];
        let replace = |invoice: &Invoice| {
            InvoiceCommand::ReplaceInvoiceItems(ReplaceInvoiceItems {
                invoice_id: invoice.id_typed(),
                items: items.clone(),
                tax_amount: 0,
                stock: StockSnapshot::default(),
                occurred_at: test_time(),
            })
        };

        let mut d = draft(CustomerId::generate(), vec![], 0);
        let cmd = replace(&d);
        assert!(execute(&mut d, &cmd).is_ok());

        let mut active = active_invoice(CustomerId::generate(), 100);
        let cmd = replace(&active);
        let err = execute(&mut active, &cmd).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { requested: 5, available: 0, .. }));
    }

    #[test]
    fn profit_is_recognized_in_proportion_to_collection() {
        let customer = CustomerId::generate();
        let mut invoice = draft(
            customer,
            vec![ItemInput::unit("Posters", 10, 100).with_cost(60)],
            0,
        );
        activate(&mut invoice, "INV-50").unwrap();
        pay(&mut invoice, customer, 250, Discount::none()).unwrap();

        let p = invoice.profit();
        assert_eq!(p.invoice_profit, 400);
        assert_eq!(p.recognized_profit, 100);
        assert_eq!(p.pending_profit, 300);
    }

    #[test]
    fn zero_total_active_invoice_counts_as_paid() {
        let mut invoice = draft(CustomerId::generate(), vec![ItemInput::unit("Proof", 1, 0)], 0);
        activate(&mut invoice, "INV-0").unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn record_carries_derived_status() {
        let invoice = active_invoice(CustomerId::generate(), 100);
        let record = invoice.to_record();
        assert_eq!(record.status, InvoiceStatus::Unpaid);
        assert_eq!(record.balance, 100);
        assert_eq!(record.version, invoice.version());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn amount_paid_never_exceeds_total(
            total in 1u64..100_000,
            steps in proptest::collection::vec((0u64..60_000, 0u64..20_000, any::<bool>()), 1..12),
        ) {
            let customer = CustomerId::generate();
            let mut invoice = active_invoice(customer, total);

            for (amount, discount, pct) in steps {
                let discount = if pct {
                    Discount::percentage(rust_decimal::Decimal::from(discount % 101))
                } else {
                    Discount::fixed(discount)
                };
                let before = invoice.amount_paid();
                match pay(&mut invoice, customer, amount, discount) {
                    Ok(_) => prop_assert!(invoice.amount_paid() > before),
                    Err(_) => prop_assert_eq!(invoice.amount_paid(), before),
                }
                prop_assert!(invoice.amount_paid() <= invoice.total_amount());

                let status = invoice.status();
                prop_assert_eq!(status == InvoiceStatus::Paid, invoice.amount_paid() >= invoice.total_amount());
                prop_assert_eq!(
                    status == InvoiceStatus::PartiallyPaid,
                    invoice.amount_paid() > 0 && invoice.amount_paid() < invoice.total_amount()
                );
            }
        }
    }
}
