//! Customer and order records.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::info;

use inkworks_core::{Amount, DomainError};
use inkworks_events::{EventBus, EventEnvelope};
use inkworks_parties::{
    ContactInfo, Customer, CustomerCommand, CustomerId, RegisterCustomer, UpdateCustomerDetails,
};
use inkworks_sales::{CreateOrder, Order, OrderCommand, OrderId};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::record_store::RecordStore;

pub struct CustomerDirectory<S, B> {
    dispatcher: Arc<CommandDispatcher<S, B>>,
}

impl<S, B> CustomerDirectory<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: Arc<CommandDispatcher<S, B>>) -> Self {
        Self { dispatcher }
    }

    pub fn register(
        &self,
        name: &str,
        contact: Option<ContactInfo>,
    ) -> Result<Customer, DispatchError> {
        let customer_id = CustomerId::generate();
        let customer: Customer = self.dispatcher.dispatch(
            customer_id.aggregate_id(),
            &CustomerCommand::RegisterCustomer(RegisterCustomer {
                customer_id,
                name: name.to_string(),
                contact,
                occurred_at: Utc::now(),
            }),
        )?;
        info!(customer_id = %customer_id, "customer registered");
        Ok(customer)
    }

    pub fn update(
        &self,
        customer_id: CustomerId,
        name: Option<String>,
        contact: Option<ContactInfo>,
    ) -> Result<Customer, DispatchError> {
        self.dispatcher.dispatch(
            customer_id.aggregate_id(),
            &CustomerCommand::UpdateCustomerDetails(UpdateCustomerDetails {
                customer_id,
                name,
                contact,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn get(&self, customer_id: CustomerId) -> Result<Customer, DispatchError> {
        Ok(self
            .dispatcher
            .load_existing::<Customer>(customer_id.aggregate_id())?
            .into_inner())
    }

    pub fn list(&self) -> Result<Vec<Customer>, DispatchError> {
        self.dispatcher.list::<Customer>()
    }
}

pub struct OrderBook<S, B> {
    dispatcher: Arc<CommandDispatcher<S, B>>,
}

impl<S, B> OrderBook<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: Arc<CommandDispatcher<S, B>>) -> Self {
        Self { dispatcher }
    }

    pub fn create(
        &self,
        customer_id: CustomerId,
        description: &str,
        total_amount: Amount,
    ) -> Result<Order, DispatchError> {
        match self.dispatcher.load::<Customer>(customer_id.aggregate_id())? {
            Some(c) if c.is_created() => {}
            _ => {
                return Err(
                    DomainError::precondition(format!("customer {customer_id} does not exist")).into(),
                );
            }
        }

        let order_id = OrderId::generate();
        let order: Order = self.dispatcher.dispatch(
            order_id.aggregate_id(),
            &OrderCommand::CreateOrder(CreateOrder {
                order_id,
                customer_id,
                description: description.to_string(),
                total_amount,
                occurred_at: Utc::now(),
            }),
        )?;
        info!(order_id = %order_id, customer_id = %customer_id, total = total_amount, "order created");
        Ok(order)
    }

    pub fn get(&self, order_id: OrderId) -> Result<Order, DispatchError> {
        Ok(self
            .dispatcher
            .load_existing::<Order>(order_id.aggregate_id())?
            .into_inner())
    }
}
