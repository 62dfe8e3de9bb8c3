use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkworks_core::{Aggregate, AggregateRoot, Amount, DomainError, aggregate_id_type};
use inkworks_events::Event;
use inkworks_parties::CustomerId;

aggregate_id_type!(
    /// Print job order identifier.
    OrderId
);

/// Payment coverage of an order, derived from its mirrored credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: Option<CustomerId>,
    description: String,
    total_amount: Amount,
    amount_paid: Amount,
    created_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            customer_id: None,
            description: String::new(),
            total_amount: 0,
            amount_paid: 0,
            created_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    pub fn amount_paid(&self) -> Amount {
        self.amount_paid
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Zero-total orders count as paid.
    pub fn payment_status(&self) -> OrderPaymentStatus {
        if self.amount_paid >= self.total_amount {
            OrderPaymentStatus::Paid
        } else if self.amount_paid > 0 {
            OrderPaymentStatus::PartiallyPaid
        } else {
            OrderPaymentStatus::Unpaid
        }
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub description: String,
    pub total_amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordOrderPayment.
///
/// Mirrors the credit applied to a linked invoice (received cash plus
/// discount). The mirror never refuses a credit the invoice accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOrderPayment {
    pub order_id: OrderId,
    pub credit: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    CreateOrder(CreateOrder),
    RecordOrderPayment(RecordOrderPayment),
}

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub description: String,
    pub total_amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderPaymentRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaymentRecorded {
    pub order_id: OrderId,
    pub credit: Amount,
    pub new_amount_paid: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
    OrderPaymentRecorded(OrderPaymentRecorded),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "sales.order.created",
            OrderEvent::OrderPaymentRecorded(_) => "sales.order.payment_recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(e) => e.occurred_at,
            OrderEvent::OrderPaymentRecorded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderCreated(e) => {
                self.id = e.order_id;
                self.customer_id = Some(e.customer_id);
                self.description = e.description.clone();
                self.total_amount = e.total_amount;
                self.amount_paid = 0;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            OrderEvent::OrderPaymentRecorded(e) => {
                self.amount_paid = e.new_amount_paid;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::CreateOrder(cmd) => self.handle_create(cmd),
            OrderCommand::RecordOrderPayment(cmd) => self.handle_record_payment(cmd),
        }
    }
}

impl Order {
    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::precondition("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }

        Ok(vec![OrderEvent::OrderCreated(OrderCreated {
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            description: cmd.description.trim().to_string(),
            total_amount: cmd.total_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_payment(
        &self,
        cmd: &RecordOrderPayment,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_order_id(cmd.order_id)?;

        if cmd.credit == 0 {
            return Err(DomainError::validation("order credit must be positive"));
        }

        let new_amount_paid = self
            .amount_paid
            .checked_add(cmd.credit)
            .ok_or_else(|| DomainError::validation("order amount_paid overflow"))?;

        Ok(vec![OrderEvent::OrderPaymentRecorded(OrderPaymentRecorded {
            order_id: cmd.order_id,
            credit: cmd.credit,
            new_amount_paid,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn created_order(total: Amount) -> Order {
        let order_id = OrderId::generate();
        let mut order = Order::empty(order_id);
        let events = order
            .handle(&OrderCommand::CreateOrder(CreateOrder {
                order_id,
                customer_id: CustomerId::generate(),
                description: "Banner 3x1m".to_string(),
                total_amount: total,
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);
        order
    }

    fn credit(order: &mut Order, amount: Amount) {
        let events = order
            .handle(&OrderCommand::RecordOrderPayment(RecordOrderPayment {
                order_id: order.id_typed(),
                credit: amount,
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);
    }

    #[test]
    fn create_order_emits_created_event() {
        let order = created_order(10_000);
        assert!(order.is_created());
        assert_eq!(order.total_amount(), 10_000);
        assert_eq!(order.amount_paid(), 0);
        assert_eq!(order.payment_status(), OrderPaymentStatus::Unpaid);
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn create_order_rejects_duplicate_creation() {
        let order = created_order(100);
        let err = order
            .handle(&OrderCommand::CreateOrder(CreateOrder {
                order_id: order.id_typed(),
                customer_id: CustomerId::generate(),
                description: String::new(),
                total_amount: 1,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict error for duplicate creation"),
        }
    }

    #[test]
    fn mirrored_credit_moves_payment_status() {
        let mut order = created_order(100);

        credit(&mut order, 50);
        assert_eq!(order.payment_status(), OrderPaymentStatus::PartiallyPaid);

        credit(&mut order, 50);
        assert_eq!(order.amount_paid(), 100);
        assert_eq!(order.payment_status(), OrderPaymentStatus::Paid);
        assert_eq!(order.version(), 3);
    }

    #[test]
    fn zero_credit_is_rejected() {
        let order = created_order(100);
        let err = order
            .handle(&OrderCommand::RecordOrderPayment(RecordOrderPayment {
                order_id: order.id_typed(),
                credit: 0,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn payment_on_missing_order_is_not_found() {
        let id = OrderId::generate();
        let err = Order::empty(id)
            .handle(&OrderCommand::RecordOrderPayment(RecordOrderPayment {
                order_id: id,
                credit: 10,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn zero_total_order_is_paid() {
        let order = created_order(0);
        assert_eq!(order.payment_status(), OrderPaymentStatus::Paid);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn amount_paid_is_sum_of_credits(credits in proptest::collection::vec(1u64..10_000, 0..10)) {
            let mut order = created_order(50_000);
            for c in &credits {
                credit(&mut order, *c);
            }
            prop_assert_eq!(order.amount_paid(), credits.iter().sum::<u64>());
            prop_assert_eq!(order.version(), 1 + credits.len() as u64);
        }
    }
}
