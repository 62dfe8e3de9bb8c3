//! Application services: each operation reads fresh state, decides through the
//! aggregates, and commits one write batch.

pub mod allocator;
pub mod commissions;
pub mod customers;
pub mod fulfillment;
pub mod lifecycle;
pub mod statistics;

use std::sync::Arc;

use serde_json::Value as JsonValue;

use inkworks_events::{EventBus, EventEnvelope};
use inkworks_inventory::StockCatalog;

use crate::command_dispatcher::CommandDispatcher;
use crate::config::EngineConfig;
use crate::record_store::RecordStore;

pub use allocator::{AllocationOutcome, Allocation, AppliedAllocation, PaymentAllocator, PaymentCommand};
pub use commissions::{AccrualInput, CommissionTracker};
pub use customers::{CustomerDirectory, OrderBook};
pub use fulfillment::{BillTo, CreateAndLinkInput, FulfillmentService, IntakeInput};
pub use lifecycle::{DraftInvoiceInput, InvoiceLifecycle};
pub use statistics::Statistics;

/// Every service wired to one dispatcher.
pub struct Engine<S, B> {
    pub dispatcher: Arc<CommandDispatcher<S, B>>,
    pub customers: CustomerDirectory<S, B>,
    pub orders: OrderBook<S, B>,
    pub invoices: Arc<InvoiceLifecycle<S, B>>,
    pub payments: PaymentAllocator<S, B>,
    pub commissions: CommissionTracker<S, B>,
    pub fulfillment: FulfillmentService<S, B>,
    pub statistics: Statistics<S, B>,
}

impl<S, B> Engine<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(store: S, bus: B, catalog: Arc<dyn StockCatalog>, config: EngineConfig) -> Self {
        let dispatcher = Arc::new(CommandDispatcher::new(store, bus));
        let invoices = Arc::new(InvoiceLifecycle::new(
            dispatcher.clone(),
            catalog,
            config.clone(),
        ));

        Self {
            customers: CustomerDirectory::new(dispatcher.clone()),
            orders: OrderBook::new(dispatcher.clone()),
            payments: PaymentAllocator::new(dispatcher.clone(), config.clone()),
            commissions: CommissionTracker::new(dispatcher.clone(), config.clone()),
            fulfillment: FulfillmentService::new(dispatcher.clone(), invoices.clone(), config),
            statistics: Statistics::new(dispatcher.clone()),
            invoices,
            dispatcher,
        }
    }
}
