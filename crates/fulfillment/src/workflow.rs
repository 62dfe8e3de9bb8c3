//! Fulfillment states, the transition table, and its guards.
//!
//! | from                         | action                 | to               |
//! |------------------------------|------------------------|------------------|
//! | pending                      | process                | processed        |
//! | pending, processed           | assign_designer        | in_design        |
//! | in_design                    | submit_design          | design_submitted |
//! | processed, design_submitted  | assign_print_operator  | in_print         |
//! | in_print                     | mark_printed           | printed          |
//! | printed                      | collect                | completed        |

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use inkworks_core::{DomainError, DomainResult, UserId};

use crate::request::{RequestPaymentStatus, SalesOrderRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Pending,
    Processed,
    InDesign,
    DesignSubmitted,
    InPrint,
    Printed,
    /// `collected` is accepted on input and normalized here.
    #[serde(alias = "collected")]
    Completed,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Processed => "processed",
            FulfillmentStatus::InDesign => "in_design",
            FulfillmentStatus::DesignSubmitted => "design_submitted",
            FulfillmentStatus::InPrint => "in_print",
            FulfillmentStatus::Printed => "printed",
            FulfillmentStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FulfillmentStatus::Completed)
    }

    /// Entering one of these stamps `processed_at`.
    pub fn stamps_processed_at(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Processed
                | FulfillmentStatus::InDesign
                | FulfillmentStatus::InPrint
                | FulfillmentStatus::Printed
                | FulfillmentStatus::Completed
        )
    }
}

impl core::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(FulfillmentStatus::Pending),
            "processed" => Ok(FulfillmentStatus::Processed),
            "in_design" => Ok(FulfillmentStatus::InDesign),
            "design_submitted" => Ok(FulfillmentStatus::DesignSubmitted),
            "in_print" => Ok(FulfillmentStatus::InPrint),
            "printed" => Ok(FulfillmentStatus::Printed),
            "completed" | "collected" => Ok(FulfillmentStatus::Completed),
            other => Err(DomainError::validation(format!(
                "unknown fulfillment status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "user_id", rename_all = "snake_case")]
pub enum WorkflowAction {
    Process,
    AssignDesigner(UserId),
    SubmitDesign,
    AssignPrintOperator(UserId),
    MarkPrinted,
    Collect,
}

impl WorkflowAction {
    /// The action that reaches `target`.
    ///
    /// `Ok(None)` when nothing leads to `target` (only `pending`). Targets that
    /// assign somebody need `assignee`.
    pub fn for_target(
        target: FulfillmentStatus,
        assignee: Option<UserId>,
    ) -> DomainResult<Option<Self>> {
        let needs_assignee = || {
            assignee.ok_or_else(|| {
                DomainError::validation(format!("moving to {target} requires an assignee"))
            })
        };

        Ok(match target {
            FulfillmentStatus::Pending => None,
            FulfillmentStatus::Processed => Some(WorkflowAction::Process),
            FulfillmentStatus::InDesign => Some(WorkflowAction::AssignDesigner(needs_assignee()?)),
            FulfillmentStatus::DesignSubmitted => Some(WorkflowAction::SubmitDesign),
            FulfillmentStatus::InPrint => {
                Some(WorkflowAction::AssignPrintOperator(needs_assignee()?))
            }
            FulfillmentStatus::Printed => Some(WorkflowAction::MarkPrinted),
            FulfillmentStatus::Completed => Some(WorkflowAction::Collect),
        })
    }
}

/// Look up the transition table. `None` means the move is not allowed.
pub fn next_status(from: FulfillmentStatus, action: &WorkflowAction) -> Option<FulfillmentStatus> {
    use FulfillmentStatus as S;
    use WorkflowAction as A;

    match (from, action) {
        (S::Pending, A::Process) => Some(S::Processed),
        (S::Pending | S::Processed, A::AssignDesigner(_)) => Some(S::InDesign),
        (S::InDesign, A::SubmitDesign) => Some(S::DesignSubmitted),
        (S::Processed | S::DesignSubmitted, A::AssignPrintOperator(_)) => Some(S::InPrint),
        (S::InPrint, A::MarkPrinted) => Some(S::Printed),
        (S::Printed, A::Collect) => Some(S::Completed),
        _ => None,
    }
}

/// Every transition needs a linked invoice.
pub fn require_linked_invoice(
    request: &SalesOrderRequest,
    target: FulfillmentStatus,
) -> DomainResult<()> {
    if request.linked_invoice_id().is_none() {
        return Err(DomainError::invoice_required(target.as_str()));
    }
    Ok(())
}

/// Printing needs the money question settled, one way or the other.
pub fn require_payment_settled(request: &SalesOrderRequest) -> DomainResult<()> {
    match request.payment_status() {
        RequestPaymentStatus::Paid | RequestPaymentStatus::Debt => Ok(()),
        RequestPaymentStatus::Pending => Err(DomainError::precondition(
            "printing requires the request to be paid or accepted as debt",
        )),
    }
}
