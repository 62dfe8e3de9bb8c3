//! Invoice lifecycle: drafts, activation and item replacement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use inkworks_core::{Amount, DomainError};
use inkworks_events::{EventBus, EventEnvelope};
use inkworks_inventory::{StockCatalog, StockSnapshot};
use inkworks_invoicing::{
    ActivateInvoice, CreateDraftInvoice, Invoice, InvoiceCommand, InvoiceId, ItemInput,
    ReplaceInvoiceItems,
};
use inkworks_parties::{Customer, CustomerId};
use inkworks_sales::{Order, OrderId};

use crate::command_dispatcher::{
    CommandDispatcher, DispatchError, Tracked, UnitOfWork, retry_on_conflict,
};
use crate::config::EngineConfig;
use crate::record_store::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftInvoiceInput {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub items: Vec<ItemInput>,
    #[serde(default)]
    pub tax_amount: Amount,
}

pub struct InvoiceLifecycle<S, B> {
    dispatcher: Arc<CommandDispatcher<S, B>>,
    catalog: Arc<dyn StockCatalog>,
    config: EngineConfig,
}

impl<S, B> InvoiceLifecycle<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(
        dispatcher: Arc<CommandDispatcher<S, B>>,
        catalog: Arc<dyn StockCatalog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            dispatcher,
            catalog,
            config,
        }
    }

    pub fn get(&self, invoice_id: InvoiceId) -> Result<Invoice, DispatchError> {
        Ok(self
            .dispatcher
            .load_existing::<Invoice>(invoice_id.aggregate_id())?
            .into_inner())
    }

    pub fn list(&self) -> Result<Vec<Invoice>, DispatchError> {
        self.dispatcher.list::<Invoice>()
    }

    /// Create a draft invoice for an existing customer.
    pub fn create_draft(&self, input: &DraftInvoiceInput) -> Result<Invoice, DispatchError> {
        let result = retry_on_conflict(self.config.max_conflict_retries, || {
            self.require_customer(input.customer_id)?;
            if let Some(order_id) = input.order_id {
                self.require_order_of(order_id, input.customer_id)?;
            }

            let mut invoice = Tracked::new(Invoice::empty(InvoiceId::generate()));
            let mut work = UnitOfWork::new();
            let draft_cmd = self.draft_command(&invoice, input, Utc::now());
            work.execute(&mut invoice, &draft_cmd)?;
            work.stage(&invoice)?;
            self.dispatcher.commit(work)?;
            Ok(invoice.into_inner())
        });

        match &result {
            Ok(invoice) => info!(
                invoice_id = %invoice.id_typed(),
                customer_id = %input.customer_id,
                total = invoice.total_amount(),
                "draft invoice created"
            ),
            Err(e) => warn!(customer_id = %input.customer_id, error = %e, "draft invoice rejected"),
        }
        result
    }

    /// Assign a real number, checking uniqueness and stock.
    pub fn activate(&self, invoice_id: InvoiceId, number: &str) -> Result<Invoice, DispatchError> {
        let result = retry_on_conflict(self.config.max_conflict_retries, || {
            let mut invoice = self
                .dispatcher
                .load_existing::<Invoice>(invoice_id.aggregate_id())?;
            let mut work = UnitOfWork::new();
            let command = self.activation_command(&invoice, number, Utc::now())?;
            work.execute(&mut invoice, &command)?;
            work.stage(&invoice)?;
            self.dispatcher.commit(work)?;
            Ok(invoice.into_inner())
        });

        match &result {
            Ok(invoice) => info!(
                invoice_id = %invoice_id,
                number = invoice.number().unwrap_or_default(),
                "invoice activated"
            ),
            Err(e) => warn!(invoice_id = %invoice_id, error = %e, "invoice activation rejected"),
        }
        result
    }

    /// Replace the whole item set; `amount_paid` is untouched.
    pub fn replace_items(
        &self,
        invoice_id: InvoiceId,
        items: &[ItemInput],
        tax_amount: Amount,
    ) -> Result<Invoice, DispatchError> {
        let result = retry_on_conflict(self.config.max_conflict_retries, || {
            let mut invoice = self
                .dispatcher
                .load_existing::<Invoice>(invoice_id.aggregate_id())?;
            let stock = self.capture_stock(items.iter().filter_map(|i| i.product_id.as_ref()));

            let mut work = UnitOfWork::new();
            work.execute(
                &mut invoice,
                &InvoiceCommand::ReplaceInvoiceItems(ReplaceInvoiceItems {
                    invoice_id,
                    items: items.to_vec(),
                    tax_amount,
                    stock,
                    occurred_at: Utc::now(),
                }),
            )?;
            work.stage(&invoice)?;
            self.dispatcher.commit(work)?;
            Ok(invoice.into_inner())
        });

        match &result {
            Ok(invoice) => info!(
                invoice_id = %invoice_id,
                total = invoice.total_amount(),
                "invoice items replaced"
            ),
            Err(e) => warn!(invoice_id = %invoice_id, error = %e, "invoice item replacement rejected"),
        }
        result
    }

    pub(crate) fn draft_command(
        &self,
        invoice: &Invoice,
        input: &DraftInvoiceInput,
        now: DateTime<Utc>,
    ) -> InvoiceCommand {
        InvoiceCommand::CreateDraftInvoice(CreateDraftInvoice {
            invoice_id: invoice.id_typed(),
            customer_id: input.customer_id,
            order_id: input.order_id,
            items: input.items.clone(),
            tax_amount: input.tax_amount,
            draft_prefix: self.config.draft_prefix.clone(),
            occurred_at: now,
        })
    }

    /// Build the activation command: rejects a number already used by another
    /// active invoice and captures stock for the invoice's catalog products.
    pub(crate) fn activation_command(
        &self,
        invoice: &Invoice,
        number: &str,
        now: DateTime<Utc>,
    ) -> Result<InvoiceCommand, DispatchError> {
        let number = number.trim();
        let taken = self.dispatcher.list::<Invoice>()?.into_iter().any(|other| {
            other.id_typed() != invoice.id_typed()
                && other.has_real_number()
                && other.number() == Some(number)
        });
        if taken {
            return Err(DomainError::conflict(format!("invoice number '{number}' is already in use")).into());
        }

        let stock = self.capture_stock(invoice.items().iter().filter_map(|i| i.product_id.as_ref()));

        Ok(InvoiceCommand::ActivateInvoice(ActivateInvoice {
            invoice_id: invoice.id_typed(),
            number: number.to_string(),
            stock,
            occurred_at: now,
        }))
    }

    fn capture_stock<'a>(
        &self,
        products: impl IntoIterator<Item = &'a inkworks_inventory::ProductId>,
    ) -> StockSnapshot {
        StockSnapshot::capture(&*self.catalog, products)
    }

    fn require_customer(&self, customer_id: CustomerId) -> Result<(), DispatchError> {
        match self.dispatcher.load::<Customer>(customer_id.aggregate_id())? {
            Some(c) if c.is_created() => Ok(()),
            _ => Err(DomainError::precondition(format!("customer {customer_id} does not exist")).into()),
        }
    }

    /// The order must exist and belong to `customer_id`.
    pub(crate) fn require_order_of(&self, order_id: OrderId, customer_id: CustomerId) -> Result<(), DispatchError> {
        match self.dispatcher.load::<Order>(order_id.aggregate_id())? {
            Some(order) if order.is_created() => {
                if order.customer_id() != Some(customer_id) {
                    return Err(DomainError::precondition(format!(
                        "order {order_id} belongs to another customer"
                    ))
                    .into());
                }
                Ok(())
            }
            _ => Err(DomainError::precondition(format!("order {order_id} does not exist")).into()),
        }
    }
}
