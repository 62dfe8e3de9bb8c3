//! Payment allocation: one incoming payment spread over several invoices.
//!
//! Every invoice update, payment row, order mirror and linked-request update
//! of one command goes into a single write batch. A conflict re-runs the whole
//! allocation from a fresh read, so a racing duplicate fails on "already paid"
//! instead of crediting twice.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use inkworks_accounting::Discount;
use inkworks_core::{Amount, DomainError, UserId};
use inkworks_events::{EventBus, EventEnvelope};
use inkworks_fulfillment::{MarkRequestPaid, RequestCommand, SalesOrderRequest};
use inkworks_invoicing::{
    ApplyPayment, Invoice, InvoiceCommand, InvoiceEvent, InvoiceId, InvoiceStatus, PaymentDetails,
    PaymentId,
};
use inkworks_parties::CustomerId;
use inkworks_sales::{Order, OrderCommand, OrderId, RecordOrderPayment};

use crate::command_dispatcher::{
    CommandDispatcher, DispatchError, Tracked, UnitOfWork, retry_on_conflict,
};
use crate::config::EngineConfig;
use crate::record_store::{Collection, RecordStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub invoice_id: InvoiceId,
    /// Cash received for this invoice.
    #[serde(alias = "amount")]
    pub amount_received: Amount,
    #[serde(default)]
    pub discount: Discount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCommand {
    pub customer_id: CustomerId,
    pub allocations: Vec<Allocation>,
    pub payment_method: String,
    pub reference_number: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub recorded_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAllocation {
    pub invoice_id: InvoiceId,
    pub payment_id: PaymentId,
    pub discount_amount: Amount,
    pub total_credit: Amount,
    pub new_amount_paid: Amount,
    pub new_status: InvoiceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub applied: Vec<AppliedAllocation>,
}

pub struct PaymentAllocator<S, B> {
    dispatcher: Arc<CommandDispatcher<S, B>>,
    config: EngineConfig,
}

impl<S, B> PaymentAllocator<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: Arc<CommandDispatcher<S, B>>, config: EngineConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Validate and apply a payment command atomically.
    pub fn allocate(&self, cmd: &PaymentCommand) -> Result<AllocationOutcome, DispatchError> {
        let result = retry_on_conflict(self.config.max_conflict_retries, || self.try_allocate(cmd));

        match &result {
            Ok(outcome) => info!(
                customer_id = %cmd.customer_id,
                reference = %cmd.reference_number,
                applied = outcome.applied.len(),
                "payment allocated"
            ),
            Err(e) => warn!(
                customer_id = %cmd.customer_id,
                reference = %cmd.reference_number,
                error = %e,
                "payment rejected"
            ),
        }
        result
    }

    fn try_allocate(&self, cmd: &PaymentCommand) -> Result<AllocationOutcome, DispatchError> {
        validate_command(cmd)?;

        let now = Utc::now();
        let details = PaymentDetails {
            payment_method: cmd.payment_method.clone(),
            reference_number: cmd.reference_number.clone(),
            notes: cmd.notes.clone(),
            recorded_by: cmd.recorded_by,
        };

        let mut work = UnitOfWork::new();
        let mut orders: BTreeMap<OrderId, Tracked<Order>> = BTreeMap::new();
        let mut settled: Vec<InvoiceId> = Vec::new();
        let mut applied = Vec::with_capacity(cmd.allocations.len());

        for (index, allocation) in cmd.allocations.iter().enumerate() {
            if allocation.amount_received == 0 && allocation.discount.value.is_zero() {
                continue;
            }
            let invoice_id = allocation.invoice_id;
            let reject = |e: DispatchError| match e {
                DispatchError::Domain(source) => DispatchError::Rejected {
                    index,
                    invoice_id,
                    source,
                },
                other => other,
            };

            let mut invoice = self
                .dispatcher
                .load_existing::<Invoice>(invoice_id.aggregate_id())
                .map_err(reject)?;

            let events = work
                .execute(
                    &mut invoice,
                    &InvoiceCommand::ApplyPayment(ApplyPayment {
                        invoice_id,
                        customer_id: cmd.customer_id,
                        payment_id: PaymentId::generate(),
                        amount_received: allocation.amount_received,
                        discount: allocation.discount.clone(),
                        details: details.clone(),
                        occurred_at: now,
                    }),
                )
                .map_err(reject)?;

            let Some(InvoiceEvent::PaymentApplied(applied_event)) = events.into_iter().next() else {
                return Err(reject(DispatchError::Domain(DomainError::precondition(
                    "invoice did not record the payment",
                ))));
            };

            work.stage(&invoice)?;
            work.insert_row(
                Collection::Payments,
                applied_event.payment.id.aggregate_id(),
                &applied_event.payment,
            )?;

            if let Some(order_id) = invoice.order_id() {
                let order = match orders.entry(order_id) {
                    Entry::Occupied(slot) => slot.into_mut(),
                    Entry::Vacant(slot) => slot.insert(
                        self.dispatcher
                            .load_existing::<Order>(order_id.aggregate_id())
                            .map_err(reject)?,
                    ),
                };
                work.execute(
                    order,
                    &OrderCommand::RecordOrderPayment(RecordOrderPayment {
                        order_id,
                        credit: applied_event.total_credit,
                        occurred_at: now,
                    }),
                )
                .map_err(reject)?;
            }

            let new_status = invoice.status();
            if new_status == InvoiceStatus::Paid {
                settled.push(invoice_id);
            }

            applied.push(AppliedAllocation {
                invoice_id,
                payment_id: applied_event.payment.id,
                discount_amount: applied_event.payment.discount_amount,
                total_credit: applied_event.total_credit,
                new_amount_paid: applied_event.new_amount_paid,
                new_status,
            });
        }

        for order in orders.values() {
            work.stage(order)?;
        }

        if !settled.is_empty() {
            self.mark_linked_requests_paid(&mut work, &settled, now)?;
        }

        self.dispatcher.commit(work)?;
        Ok(AllocationOutcome { applied })
    }

    fn mark_linked_requests_paid(
        &self,
        work: &mut UnitOfWork,
        settled: &[InvoiceId],
        now: chrono::DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let requests = self.dispatcher.list_tracked::<SalesOrderRequest>()?;

        for mut request in requests {
            let Some(invoice_id) = request.linked_invoice_id() else {
                continue;
            };
            if !settled.contains(&invoice_id) {
                continue;
            }
            let request_id = request.id_typed();
            work.execute(
                &mut request,
                &RequestCommand::MarkRequestPaid(MarkRequestPaid {
                    request_id,
                    invoice_id,
                    occurred_at: now,
                }),
            )?;
            work.stage(&request)?;
        }
        Ok(())
    }
}

/// Command-level checks that do not need any stored state.
fn validate_command(cmd: &PaymentCommand) -> Result<(), DispatchError> {
    if cmd.payment_method.trim().is_empty() {
        return Err(DomainError::validation("payment_method cannot be empty").into());
    }
    if cmd.reference_number.trim().is_empty() {
        return Err(DomainError::validation("reference_number cannot be empty").into());
    }
    if !cmd.allocations.iter().any(|a| a.amount_received > 0) {
        return Err(
            DomainError::validation("at least one allocation must receive a positive amount")
                .into(),
        );
    }

    for (index, allocation) in cmd.allocations.iter().enumerate() {
        let first = cmd
            .allocations
            .iter()
            .position(|a| a.invoice_id == allocation.invoice_id);
        if first != Some(index) {
            return Err(DispatchError::Rejected {
                index,
                invoice_id: allocation.invoice_id,
                source: DomainError::validation("invoice appears more than once in the payment"),
            });
        }
        allocation.discount.validate().map_err(|source| DispatchError::Rejected {
            index,
            invoice_id: allocation.invoice_id,
            source,
        })?;
    }
    Ok(())
}
