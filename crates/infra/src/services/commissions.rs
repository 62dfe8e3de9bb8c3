//! Commission accrual, settlement and totals.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use inkworks_accounting::{
    AccrueCommission, Commission, CommissionCommand, CommissionId, CommissionTotals,
    CommissionType, SettleCommission,
};
use inkworks_core::{Amount, DomainError, UserId};
use inkworks_events::{EventBus, EventEnvelope};
use inkworks_sales::{Order, OrderId};

use crate::command_dispatcher::{CommandDispatcher, DispatchError, retry_on_conflict};
use crate::config::EngineConfig;
use crate::record_store::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualInput {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub commission_type: CommissionType,
    pub percentage: Decimal,
    /// Defaults to the order total.
    #[serde(default)]
    pub base_amount: Option<Amount>,
}

pub struct CommissionTracker<S, B> {
    dispatcher: Arc<CommandDispatcher<S, B>>,
    config: EngineConfig,
}

impl<S, B> CommissionTracker<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: Arc<CommandDispatcher<S, B>>, config: EngineConfig) -> Self {
        Self { dispatcher, config }
    }

    pub fn accrue(&self, input: &AccrualInput) -> Result<Commission, DispatchError> {
        let order = match self.dispatcher.load::<Order>(input.order_id.aggregate_id())? {
            Some(order) if order.is_created() => order,
            _ => {
                return Err(DomainError::precondition(format!(
                    "order {} does not exist",
                    input.order_id
                ))
                .into());
            }
        };

        let commission_id = CommissionId::generate();
        let commission: Commission = self.dispatcher.dispatch(
            commission_id.aggregate_id(),
            &CommissionCommand::AccrueCommission(AccrueCommission {
                commission_id,
                order_id: input.order_id,
                user_id: input.user_id,
                commission_type: input.commission_type,
                percentage: input.percentage,
                base_amount: input.base_amount.unwrap_or(order.total_amount()),
                occurred_at: Utc::now(),
            }),
        )?;

        info!(
            commission_id = %commission_id,
            order_id = %input.order_id,
            user_id = %input.user_id,
            amount = commission.commission_amount(),
            "commission accrued"
        );
        Ok(commission)
    }

    /// Mark a commission paid. One-way: a second settlement is a conflict.
    pub fn settle(&self, commission_id: CommissionId, actor_id: UserId) -> Result<Commission, DispatchError> {
        let result = retry_on_conflict(self.config.max_conflict_retries, || {
            self.dispatcher.dispatch::<Commission>(
                commission_id.aggregate_id(),
                &CommissionCommand::SettleCommission(SettleCommission {
                    commission_id,
                    actor_id,
                    occurred_at: Utc::now(),
                }),
            )
        });

        match &result {
            Ok(c) => info!(commission_id = %commission_id, paid_by = %actor_id, amount = c.commission_amount(), "commission settled"),
            Err(e) => warn!(commission_id = %commission_id, error = %e, "commission settlement rejected"),
        }
        result
    }

    pub fn get(&self, commission_id: CommissionId) -> Result<Commission, DispatchError> {
        Ok(self
            .dispatcher
            .load_existing::<Commission>(commission_id.aggregate_id())?
            .into_inner())
    }

    pub fn list(&self) -> Result<Vec<Commission>, DispatchError> {
        self.dispatcher.list::<Commission>()
    }

    /// Pending and paid sums recomputed from every commission row.
    pub fn totals(&self, user_id: Option<UserId>) -> Result<CommissionTotals, DispatchError> {
        let all = self.list()?;
        Ok(CommissionTotals::compute(all.iter(), user_id))
    }
}
