//! Fulfillment requests: intake, gated transitions and gate remediation.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use inkworks_core::{Amount, DomainError, UserId};
use inkworks_events::{EventBus, EventEnvelope};
use inkworks_fulfillment::{
    CustomerIdentity, DecidePayment, FulfillmentStatus, IntakeRequest, LinkInvoice,
    PaymentDecision, RequestCommand, RequestId, SalesOrderRequest, TransitionRequest,
};
use inkworks_invoicing::{Invoice, InvoiceId, InvoiceStatus, ItemInput};
use inkworks_parties::{ContactInfo, Customer, CustomerCommand, CustomerId, RegisterCustomer};
use inkworks_sales::OrderId;

use crate::command_dispatcher::{
    CommandDispatcher, DispatchError, Tracked, UnitOfWork, retry_on_conflict,
};
use crate::config::EngineConfig;
use crate::record_store::RecordStore;
use crate::services::lifecycle::{DraftInvoiceInput, InvoiceLifecycle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeInput {
    pub customer: CustomerIdentity,
    pub description: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Who the invoice created for a request is billed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BillTo {
    Existing {
        customer_id: CustomerId,
    },
    New {
        name: String,
        #[serde(default)]
        contact: Option<ContactInfo>,
    },
    /// Register a customer from the identity captured at intake.
    FromRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAndLinkInput {
    pub bill_to: BillTo,
    pub number: String,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub items: Vec<ItemInput>,
    #[serde(default)]
    pub tax_amount: Amount,
}

pub struct FulfillmentService<S, B> {
    dispatcher: Arc<CommandDispatcher<S, B>>,
    invoices: Arc<InvoiceLifecycle<S, B>>,
    config: EngineConfig,
}

impl<S, B> FulfillmentService<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(
        dispatcher: Arc<CommandDispatcher<S, B>>,
        invoices: Arc<InvoiceLifecycle<S, B>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            dispatcher,
            invoices,
            config,
        }
    }

    pub fn get(&self, request_id: RequestId) -> Result<SalesOrderRequest, DispatchError> {
        Ok(self
            .dispatcher
            .load_existing::<SalesOrderRequest>(request_id.aggregate_id())?
            .into_inner())
    }

    pub fn list(&self) -> Result<Vec<SalesOrderRequest>, DispatchError> {
        self.dispatcher.list::<SalesOrderRequest>()
    }

    pub fn intake(&self, input: &IntakeInput) -> Result<SalesOrderRequest, DispatchError> {
        let request_id = RequestId::generate();
        let request: SalesOrderRequest = self.dispatcher.dispatch(
            request_id.aggregate_id(),
            &RequestCommand::IntakeRequest(IntakeRequest {
                request_id,
                customer: input.customer.clone(),
                description: input.description.clone(),
                notes: input.notes.clone(),
                occurred_at: Utc::now(),
            }),
        )?;
        info!(request_id = %request_id, "request intaken");
        Ok(request)
    }

    /// Move a request to `target`; refused with `InvoiceRequired` while no invoice is linked.
    pub fn transition(
        &self,
        request_id: RequestId,
        target: FulfillmentStatus,
        assignee: Option<UserId>,
        actor_id: UserId,
    ) -> Result<SalesOrderRequest, DispatchError> {
        let result = retry_on_conflict(self.config.max_conflict_retries, || {
            self.dispatcher.dispatch::<SalesOrderRequest>(
                request_id.aggregate_id(),
                &RequestCommand::TransitionRequest(TransitionRequest {
                    request_id,
                    target,
                    assignee,
                    actor_id,
                    occurred_at: Utc::now(),
                }),
            )
        });

        match &result {
            Ok(r) => info!(request_id = %request_id, status = %r.status(), actor_id = %actor_id, "request transitioned"),
            Err(e) => warn!(request_id = %request_id, target = %target, error = %e, "request transition refused"),
        }
        result
    }

    /// Attach an existing activated invoice that no other request holds.
    pub fn link_invoice(
        &self,
        request_id: RequestId,
        invoice_id: InvoiceId,
    ) -> Result<SalesOrderRequest, DispatchError> {
        let result = retry_on_conflict(self.config.max_conflict_retries, || {
            let invoice = self
                .dispatcher
                .load_existing::<Invoice>(invoice_id.aggregate_id())?;
            self.ensure_not_linked_elsewhere(request_id, invoice_id)?;

            let mut request = self
                .dispatcher
                .load_existing::<SalesOrderRequest>(request_id.aggregate_id())?;
            let mut work = UnitOfWork::new();
            work.execute(&mut request, &link_command(request_id, &invoice))?;
            work.stage(&request)?;
            self.dispatcher.commit(work)?;
            Ok(request.into_inner())
        });

        match &result {
            Ok(_) => info!(request_id = %request_id, invoice_id = %invoice_id, "invoice linked"),
            Err(e) => warn!(request_id = %request_id, invoice_id = %invoice_id, error = %e, "invoice link refused"),
        }
        result
    }

    /// Register the customer if needed, create and activate an invoice, and
    /// link it to the request, all in one write batch.
    pub fn create_invoice_and_link(
        &self,
        request_id: RequestId,
        input: &CreateAndLinkInput,
    ) -> Result<(SalesOrderRequest, Invoice), DispatchError> {
        let result = retry_on_conflict(self.config.max_conflict_retries, || {
            let now = Utc::now();
            let mut work = UnitOfWork::new();

            let mut request = self
                .dispatcher
                .load_existing::<SalesOrderRequest>(request_id.aggregate_id())?;
            if let Some(existing) = request.linked_invoice_id() {
                return Err(DomainError::conflict(format!(
                    "request is already linked to invoice {existing}"
                ))
                .into());
            }

            let customer_id = match &input.bill_to {
                BillTo::Existing { customer_id } => {
                    self.dispatcher
                        .load::<Customer>(customer_id.aggregate_id())?
                        .filter(|c| c.is_created())
                        .ok_or_else(|| {
                            DomainError::precondition(format!("customer {customer_id} does not exist"))
                        })?;
                    *customer_id
                }
                BillTo::New { name, contact } => {
                    register_customer(&mut work, name, contact.clone(), now)?
                }
                BillTo::FromRequest => {
                    let identity = request.customer();
                    let contact = ContactInfo {
                        phone: identity.phone.clone(),
                        email: identity.email.clone(),
                        address: None,
                    };
                    register_customer(&mut work, &identity.name, Some(contact), now)?
                }
            };
            // A freshly registered customer owns no order, so this refuses any order_id there.
            if let Some(order_id) = input.order_id {
                self.invoices.require_order_of(order_id, customer_id)?;
            }

            let draft = DraftInvoiceInput {
                customer_id,
                order_id: input.order_id,
                items: input.items.clone(),
                tax_amount: input.tax_amount,
            };
            let mut invoice = Tracked::new(Invoice::empty(InvoiceId::generate()));
            let draft_cmd = self.invoices.draft_command(&invoice, &draft, now);
            work.execute(&mut invoice, &draft_cmd)?;
            let activation = self.invoices.activation_command(&invoice, &input.number, now)?;
            work.execute(&mut invoice, &activation)?;
            work.stage(&invoice)?;

            work.execute(&mut request, &link_command(request_id, &invoice))?;
            work.stage(&request)?;

            self.dispatcher.commit(work)?;
            Ok((request.into_inner(), invoice.into_inner()))
        });

        match &result {
            Ok((_, invoice)) => info!(
                request_id = %request_id,
                invoice_id = %invoice.id_typed(),
                total = invoice.total_amount(),
                "invoice created and linked"
            ),
            Err(e) => warn!(request_id = %request_id, error = %e, "invoice creation for request refused"),
        }
        result
    }

    pub fn decide_payment(
        &self,
        request_id: RequestId,
        decision: PaymentDecision,
        actor_id: UserId,
    ) -> Result<SalesOrderRequest, DispatchError> {
        let result = retry_on_conflict(self.config.max_conflict_retries, || {
            self.dispatcher.dispatch::<SalesOrderRequest>(
                request_id.aggregate_id(),
                &RequestCommand::DecidePayment(DecidePayment {
                    request_id,
                    decision,
                    actor_id,
                    occurred_at: Utc::now(),
                }),
            )
        });

        match &result {
            Ok(_) => info!(request_id = %request_id, decision = ?decision, "payment decided"),
            Err(e) => warn!(request_id = %request_id, error = %e, "payment decision refused"),
        }
        result
    }

    fn ensure_not_linked_elsewhere(
        &self,
        request_id: RequestId,
        invoice_id: InvoiceId,
    ) -> Result<(), DispatchError> {
        let holder = self
            .dispatcher
            .list::<SalesOrderRequest>()?
            .into_iter()
            .find(|r| r.id_typed() != request_id && r.linked_invoice_id() == Some(invoice_id));

        match holder {
            Some(other) => Err(DomainError::conflict(format!(
                "invoice {invoice_id} is already linked to request {}",
                other.id_typed()
            ))
            .into()),
            None => Ok(()),
        }
    }
}

fn link_command(request_id: RequestId, invoice: &Invoice) -> RequestCommand {
    RequestCommand::LinkInvoice(LinkInvoice {
        request_id,
        invoice_id: invoice.id_typed(),
        invoice_has_real_number: !invoice.is_draft() && invoice.has_real_number(),
        invoice_fully_paid: invoice.status() == InvoiceStatus::Paid,
        occurred_at: Utc::now(),
    })
}

fn register_customer(
    work: &mut UnitOfWork,
    name: &str,
    contact: Option<ContactInfo>,
    now: chrono::DateTime<Utc>,
) -> Result<CustomerId, DispatchError> {
    let customer_id = CustomerId::generate();
    let mut customer = Tracked::new(Customer::empty(customer_id));
    work.execute(
        &mut customer,
        &CustomerCommand::RegisterCustomer(RegisterCustomer {
            customer_id,
            name: name.to_string(),
            contact,
            occurred_at: now,
        }),
    )?;
    work.stage(&customer)?;
    Ok(customer_id)
}
