use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use inkworks_core::money::to_amount;
use inkworks_core::{
    Aggregate, AggregateRoot, Amount, AmountSum, DomainError, UserId, aggregate_id_type,
};
use inkworks_events::Event;
use inkworks_sales::OrderId;

aggregate_id_type!(
    /// Commission record identifier.
    CommissionId
);

/// Which part of the job the commission rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionType {
    Sales,
    Design,
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaidStatus {
    Unpaid,
    Paid,
}

/// Aggregate root: Commission.
///
/// Settlement is one-way: once `paid`, nothing moves it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    id: CommissionId,
    order_id: Option<OrderId>,
    user_id: Option<UserId>,
    commission_type: CommissionType,
    commission_percentage: Decimal,
    base_amount: Amount,
    commission_amount: Amount,
    paid_status: PaidStatus,
    accrued_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    paid_by: Option<UserId>,
    version: u64,
    created: bool,
}

impl Commission {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: CommissionId) -> Self {
        Self {
            id,
            order_id: None,
            user_id: None,
            commission_type: CommissionType::Sales,
            commission_percentage: Decimal::ZERO,
            base_amount: 0,
            commission_amount: 0,
            paid_status: PaidStatus::Unpaid,
            accrued_at: None,
            paid_at: None,
            paid_by: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CommissionId {
        self.id
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn commission_type(&self) -> CommissionType {
        self.commission_type
    }

    pub fn commission_percentage(&self) -> Decimal {
        self.commission_percentage
    }

    pub fn base_amount(&self) -> Amount {
        self.base_amount
    }

    pub fn commission_amount(&self) -> Amount {
        self.commission_amount
    }

    pub fn paid_status(&self) -> PaidStatus {
        self.paid_status
    }

    pub fn accrued_at(&self) -> Option<DateTime<Utc>> {
        self.accrued_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn paid_by(&self) -> Option<UserId> {
        self.paid_by
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Commission {
    type Id = CommissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AccrueCommission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrueCommission {
    pub commission_id: CommissionId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub commission_type: CommissionType,
    pub percentage: Decimal,
    pub base_amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SettleCommission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleCommission {
    pub commission_id: CommissionId,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommissionCommand {
    AccrueCommission(AccrueCommission),
    SettleCommission(SettleCommission),
}

/// Event: CommissionAccrued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionAccrued {
    pub commission_id: CommissionId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub commission_type: CommissionType,
    pub percentage: Decimal,
    pub base_amount: Amount,
    pub commission_amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CommissionSettled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSettled {
    pub commission_id: CommissionId,
    pub paid_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommissionEvent {
    CommissionAccrued(CommissionAccrued),
    CommissionSettled(CommissionSettled),
}

impl Event for CommissionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CommissionEvent::CommissionAccrued(_) => "accounting.commission.accrued",
            CommissionEvent::CommissionSettled(_) => "accounting.commission.settled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CommissionEvent::CommissionAccrued(e) => e.occurred_at,
            CommissionEvent::CommissionSettled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Commission {
    type Command = CommissionCommand;
    type Event = CommissionEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CommissionEvent::CommissionAccrued(e) => {
                self.id = e.commission_id;
                self.order_id = Some(e.order_id);
                self.user_id = Some(e.user_id);
                self.commission_type = e.commission_type;
                self.commission_percentage = e.percentage;
                self.base_amount = e.base_amount;
                self.commission_amount = e.commission_amount;
                self.paid_status = PaidStatus::Unpaid;
                self.accrued_at = Some(e.occurred_at);
                self.created = true;
            }
            CommissionEvent::CommissionSettled(e) => {
                self.paid_status = PaidStatus::Paid;
                self.paid_at = Some(e.occurred_at);
                self.paid_by = Some(e.paid_by);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CommissionCommand::AccrueCommission(cmd) => self.handle_accrue(cmd),
            CommissionCommand::SettleCommission(cmd) => self.handle_settle(cmd),
        }
    }
}

impl Commission {
    fn handle_accrue(&self, cmd: &AccrueCommission) -> Result<Vec<CommissionEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("commission already exists"));
        }

        if cmd.percentage < Decimal::ZERO || cmd.percentage > Decimal::ONE_HUNDRED {
            return Err(DomainError::validation(format!(
                "commission percentage must be within 0..=100, got {}",
                cmd.percentage
            )));
        }

        let commission_amount = to_amount(
            Decimal::from(cmd.base_amount) * cmd.percentage / Decimal::ONE_HUNDRED,
            "commission_amount",
        )?;

        Ok(vec![CommissionEvent::CommissionAccrued(CommissionAccrued {
            commission_id: cmd.commission_id,
            order_id: cmd.order_id,
            user_id: cmd.user_id,
            commission_type: cmd.commission_type,
            percentage: cmd.percentage,
            base_amount: cmd.base_amount,
            commission_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_settle(&self, cmd: &SettleCommission) -> Result<Vec<CommissionEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != cmd.commission_id {
            return Err(DomainError::precondition("commission_id mismatch"));
        }

        if self.paid_status == PaidStatus::Paid {
            return Err(DomainError::conflict("commission is already paid"));
        }

        Ok(vec![CommissionEvent::CommissionSettled(CommissionSettled {
            commission_id: cmd.commission_id,
            paid_by: cmd.actor_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

/// Pending (unpaid) and paid commission sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTotals {
    pub pending: AmountSum,
    pub paid: AmountSum,
}

impl CommissionTotals {
    /// Sum over `commissions`, optionally restricted to one user.
    pub fn compute<'a>(
        commissions: impl IntoIterator<Item = &'a Commission>,
        user: Option<UserId>,
    ) -> Self {
        commissions
            .into_iter()
            .filter(|c| c.created)
            .filter(|c| user.is_none() || c.user_id == user)
            .fold(Self::default(), |mut acc, c| {
                match c.paid_status {
                    PaidStatus::Unpaid => acc.pending += AmountSum::from(c.commission_amount),
                    PaidStatus::Paid => acc.paid += AmountSum::from(c.commission_amount),
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn accrue(user: UserId, pct: Decimal, base: Amount) -> Result<Commission, DomainError> {
        let id = CommissionId::generate();
        let mut commission = Commission::empty(id);
        let events = commission.handle(&CommissionCommand::AccrueCommission(AccrueCommission {
            commission_id: id,
            order_id: OrderId::generate(),
            user_id: user,
            commission_type: CommissionType::Sales,
            percentage: pct,
            base_amount: base,
            occurred_at: test_time(),
        }))?;
        for ev in &events {
            commission.apply(ev);
        }
        Ok(commission)
    }

    fn settle(commission: &Commission, actor: UserId) -> Result<Vec<CommissionEvent>, DomainError> {
        commission.handle(&CommissionCommand::SettleCommission(SettleCommission {
            commission_id: commission.id_typed(),
            actor_id: actor,
            occurred_at: test_time(),
        }))
    }

    #[test]
    fn accrual_rounds_amount_to_minor_unit() {
        // 7.5% of 12_345 = 925.875 -> 926
        let c = accrue(UserId::new(), dec!(7.5), 12_345).unwrap();
        assert_eq!(c.commission_amount(), 926);
        assert_eq!(c.paid_status(), PaidStatus::Unpaid);
        assert!(c.accrued_at().is_some());
    }

    #[test]
    fn accrual_rejects_percentage_out_of_range() {
        for pct in [dec!(-0.5), dec!(100.5)] {
            match accrue(UserId::new(), pct, 1_000).unwrap_err() {
                DomainError::Validation(msg) if msg.contains("percentage") => {}
                other => panic!("Expected Validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn settlement_is_one_way() {
        let actor = UserId::new();
        let mut c = accrue(UserId::new(), dec!(10), 5_000).unwrap();

        let events = settle(&c, actor).unwrap();
        c.apply(&events[0]);
        assert_eq!(c.paid_status(), PaidStatus::Paid);
        assert_eq!(c.paid_by(), Some(actor));
        let paid_at = c.paid_at();
        assert!(paid_at.is_some());

        let err = settle(&c, UserId::new()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(c.paid_status(), PaidStatus::Paid);
        assert_eq!(c.paid_at(), paid_at);
    }

    #[test]
    fn settle_unknown_commission_is_not_found() {
        let c = Commission::empty(CommissionId::generate());
        assert_eq!(settle(&c, UserId::new()).unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn totals_split_pending_and_paid_and_filter_by_user() {
        let alice = UserId::new();
        let bob = UserId::new();

        let a1 = accrue(alice, dec!(10), 1_000).unwrap();
        let mut a2 = accrue(alice, dec!(5), 2_000).unwrap();
        let b1 = accrue(bob, dec!(20), 1_000).unwrap();

        let events = settle(&a2, UserId::new()).unwrap();
        a2.apply(&events[0]);

        let all = [a1, a2, b1];
        assert_eq!(
            CommissionTotals::compute(&all, None),
            CommissionTotals { pending: 300, paid: 100 }
        );
        assert_eq!(
            CommissionTotals::compute(&all, Some(alice)),
            CommissionTotals { pending: 100, paid: 100 }
        );
        assert_eq!(
            CommissionTotals::compute(&all, Some(bob)),
            CommissionTotals { pending: 200, paid: 0 }
        );
    }

    #[test]
    fn totals_do_not_overflow_on_large_commissions() {
        let user = UserId::new();
        let all = [
            accrue(user, dec!(100), Amount::MAX).unwrap(),
            accrue(user, dec!(100), Amount::MAX).unwrap(),
        ];

        let totals = CommissionTotals::compute(&all, Some(user));
        assert_eq!(totals.pending, AmountSum::from(Amount::MAX) * 2);
        assert_eq!(totals.paid, 0);
    }
}
