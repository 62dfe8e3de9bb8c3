//! Financial statistics, recomputed from stored invoices on every call.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use inkworks_events::{EventBus, EventEnvelope};
use inkworks_invoicing::{CustomerStatement, FinancialSummary, Invoice, InvoiceId, InvoiceProfit, Payment};
use inkworks_parties::{Customer, CustomerId};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::record_store::{Collection, RecordStore};

pub struct Statistics<S, B> {
    dispatcher: Arc<CommandDispatcher<S, B>>,
}

impl<S, B> Statistics<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: Arc<CommandDispatcher<S, B>>) -> Self {
        Self { dispatcher }
    }

    pub fn summary(&self) -> Result<FinancialSummary, DispatchError> {
        let invoices = self.dispatcher.list::<Invoice>()?;
        Ok(FinancialSummary::compute(&invoices))
    }

    pub fn customer_statement(&self, customer_id: CustomerId) -> Result<CustomerStatement, DispatchError> {
        self.dispatcher
            .load_existing::<Customer>(customer_id.aggregate_id())?;
        let invoices = self.dispatcher.list::<Invoice>()?;
        Ok(CustomerStatement::compute(customer_id, &invoices))
    }

    pub fn invoice_profit(&self, invoice_id: InvoiceId) -> Result<InvoiceProfit, DispatchError> {
        let invoice = self
            .dispatcher
            .load_existing::<Invoice>(invoice_id.aggregate_id())?;
        Ok(InvoiceProfit::of(&invoice))
    }

    /// Standalone payment rows for one invoice, oldest first.
    pub fn payments_for(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, DispatchError> {
        let mut payments: Vec<Payment> = self
            .dispatcher
            .list_rows::<Payment>(Collection::Payments)?
            .into_iter()
            .filter(|p| p.invoice_id == invoice_id)
            .collect();
        payments.sort_by_key(|p| p.payment_date);
        Ok(payments)
    }
}
