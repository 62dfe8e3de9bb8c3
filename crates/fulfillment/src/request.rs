use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkworks_core::{Aggregate, AggregateRoot, DomainError, UserId, aggregate_id_type};
use inkworks_events::Event;
use inkworks_invoicing::InvoiceId;

use crate::workflow::{
    FulfillmentStatus, WorkflowAction, next_status, require_linked_invoice,
    require_payment_settled,
};

aggregate_id_type!(
    /// Sales order request identifier.
    RequestId
);

/// Customer details captured at intake, before any customer record exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPaymentStatus {
    Pending,
    Paid,
    Debt,
}

/// What staff decided about payment before printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentDecision {
    Paid,
    Debt,
}

impl From<PaymentDecision> for RequestPaymentStatus {
    fn from(value: PaymentDecision) -> Self {
        match value {
            PaymentDecision::Paid => RequestPaymentStatus::Paid,
            PaymentDecision::Debt => RequestPaymentStatus::Debt,
        }
    }
}

/// Aggregate root: SalesOrderRequest.
///
/// Status only changes through the transition table in [`crate::workflow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderRequest {
    id: RequestId,
    customer: CustomerIdentity,
    description: String,
    notes: Option<String>,
    status: FulfillmentStatus,
    linked_invoice_id: Option<InvoiceId>,
    payment_status: RequestPaymentStatus,
    designer_id: Option<UserId>,
    print_operator_id: Option<UserId>,
    processed_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl SalesOrderRequest {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: RequestId) -> Self {
        Self {
            id,
            customer: CustomerIdentity::default(),
            description: String::new(),
            notes: None,
            status: FulfillmentStatus::Pending,
            linked_invoice_id: None,
            payment_status: RequestPaymentStatus::Pending,
            designer_id: None,
            print_operator_id: None,
            processed_at: None,
            created_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> RequestId {
        self.id
    }

    pub fn customer(&self) -> &CustomerIdentity {
        &self.customer
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn status(&self) -> FulfillmentStatus {
        self.status
    }

    pub fn linked_invoice_id(&self) -> Option<InvoiceId> {
        self.linked_invoice_id
    }

    pub fn payment_status(&self) -> RequestPaymentStatus {
        self.payment_status
    }

    pub fn designer_id(&self) -> Option<UserId> {
        self.designer_id
    }

    pub fn print_operator_id(&self) -> Option<UserId> {
        self.print_operator_id
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for SalesOrderRequest {
    type Id = RequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: IntakeRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRequest {
    pub request_id: RequestId,
    pub customer: CustomerIdentity,
    pub description: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: LinkInvoice.
///
/// The caller read the invoice and reports what it found; the request only
/// accepts an activated invoice with a real number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInvoice {
    pub request_id: RequestId,
    pub invoice_id: InvoiceId,
    pub invoice_has_real_number: bool,
    pub invoice_fully_paid: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: TransitionRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub request_id: RequestId,
    pub target: FulfillmentStatus,
    pub assignee: Option<UserId>,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DecidePayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecidePayment {
    pub request_id: RequestId,
    pub decision: PaymentDecision,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkRequestPaid (the linked invoice became fully paid).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkRequestPaid {
    pub request_id: RequestId,
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestCommand {
    IntakeRequest(IntakeRequest),
    LinkInvoice(LinkInvoice),
    TransitionRequest(TransitionRequest),
    DecidePayment(DecidePayment),
    MarkRequestPaid(MarkRequestPaid),
}

/// Event: RequestIntaken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIntaken {
    pub request_id: RequestId,
    pub customer: CustomerIdentity,
    pub description: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceLinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLinked {
    pub request_id: RequestId,
    pub invoice_id: InvoiceId,
    pub invoice_fully_paid: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestTransitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTransitioned {
    pub request_id: RequestId,
    pub from: FulfillmentStatus,
    pub to: FulfillmentStatus,
    pub action: WorkflowAction,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentDecided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDecided {
    pub request_id: RequestId,
    pub decision: PaymentDecision,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestMarkedPaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMarkedPaid {
    pub request_id: RequestId,
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestEvent {
    RequestIntaken(RequestIntaken),
    InvoiceLinked(InvoiceLinked),
    RequestTransitioned(RequestTransitioned),
    PaymentDecided(PaymentDecided),
    RequestMarkedPaid(RequestMarkedPaid),
}

impl Event for RequestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RequestEvent::RequestIntaken(_) => "fulfillment.request.intaken",
            RequestEvent::InvoiceLinked(_) => "fulfillment.request.invoice_linked",
            RequestEvent::RequestTransitioned(_) => "fulfillment.request.transitioned",
            RequestEvent::PaymentDecided(_) => "fulfillment.request.payment_decided",
            RequestEvent::RequestMarkedPaid(_) => "fulfillment.request.marked_paid",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RequestEvent::RequestIntaken(e) => e.occurred_at,
            RequestEvent::InvoiceLinked(e) => e.occurred_at,
            RequestEvent::RequestTransitioned(e) => e.occurred_at,
            RequestEvent::PaymentDecided(e) => e.occurred_at,
            RequestEvent::RequestMarkedPaid(e) => e.occurred_at,
        }
    }
}

impl Aggregate for SalesOrderRequest {
    type Command = RequestCommand;
    type Event = RequestEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RequestEvent::RequestIntaken(e) => {
                self.id = e.request_id;
                self.customer = e.customer.clone();
                self.description = e.description.clone();
                self.notes = e.notes.clone();
                self.status = FulfillmentStatus::Pending;
                self.payment_status = RequestPaymentStatus::Pending;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            RequestEvent::InvoiceLinked(e) => {
                self.linked_invoice_id = Some(e.invoice_id);
                if e.invoice_fully_paid {
                    self.payment_status = RequestPaymentStatus::Paid;
                }
            }
            RequestEvent::RequestTransitioned(e) => {
                self.status = e.to;
                match e.action {
                    WorkflowAction::AssignDesigner(user) => self.designer_id = Some(user),
                    WorkflowAction::AssignPrintOperator(user) => {
                        self.print_operator_id = Some(user)
                    }
                    _ => {}
                }
                if e.to.stamps_processed_at() {
                    self.processed_at = Some(e.occurred_at);
                }
            }
            RequestEvent::PaymentDecided(e) => {
                self.payment_status = e.decision.into();
            }
            RequestEvent::RequestMarkedPaid(_) => {
                self.payment_status = RequestPaymentStatus::Paid;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RequestCommand::IntakeRequest(cmd) => self.handle_intake(cmd),
            RequestCommand::LinkInvoice(cmd) => self.handle_link_invoice(cmd),
            RequestCommand::TransitionRequest(cmd) => self.handle_transition(cmd),
            RequestCommand::DecidePayment(cmd) => self.handle_decide_payment(cmd),
            RequestCommand::MarkRequestPaid(cmd) => self.handle_mark_paid(cmd),
        }
    }
}

impl SalesOrderRequest {
    fn ensure_exists(&self, request_id: RequestId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != request_id {
            return Err(DomainError::precondition("request_id mismatch"));
        }
        Ok(())
    }

    fn handle_intake(&self, cmd: &IntakeRequest) -> Result<Vec<RequestEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("request already exists"));
        }

        let name = cmd.customer.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        let description = cmd.description.trim();
        if description.is_empty() {
            return Err(DomainError::validation("description cannot be empty"));
        }

        Ok(vec![RequestEvent::RequestIntaken(RequestIntaken {
            request_id: cmd.request_id,
            customer: CustomerIdentity {
                name: name.to_string(),
                ..cmd.customer.clone()
            },
            description: description.to_string(),
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_link_invoice(&self, cmd: &LinkInvoice) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_exists(cmd.request_id)?;

        if let Some(existing) = self.linked_invoice_id {
            return Err(DomainError::conflict(format!(
                "request is already linked to invoice {existing}"
            )));
        }
        if !cmd.invoice_has_real_number {
            return Err(DomainError::precondition(
                "only an activated invoice with a real number can be linked",
            ));
        }

        Ok(vec![RequestEvent::InvoiceLinked(InvoiceLinked {
            request_id: cmd.request_id,
            invoice_id: cmd.invoice_id,
            invoice_fully_paid: cmd.invoice_fully_paid,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_transition(
        &self,
        cmd: &TransitionRequest,
    ) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_exists(cmd.request_id)?;

        let invalid = || DomainError::invalid_transition(self.status.as_str(), cmd.target.as_str());
        let action = WorkflowAction::for_target(cmd.target, cmd.assignee)?.ok_or_else(invalid)?;
        let to = next_status(self.status, &action).ok_or_else(invalid)?;

        require_linked_invoice(self, to)?;
        if matches!(action, WorkflowAction::AssignPrintOperator(_)) {
            require_payment_settled(self)?;
        }

        Ok(vec![RequestEvent::RequestTransitioned(RequestTransitioned {
            request_id: cmd.request_id,
            from: self.status,
            to,
            action,
            actor_id: cmd.actor_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_decide_payment(
        &self,
        cmd: &DecidePayment,
    ) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_exists(cmd.request_id)?;

        if self.linked_invoice_id.is_none() {
            return Err(DomainError::precondition(
                "link an invoice before deciding payment",
            ));
        }
        if self.status == FulfillmentStatus::Pending {
            return Err(DomainError::precondition(
                "payment can only be decided once the request has left pending",
            ));
        }
        if self.status.is_terminal() {
            return Err(DomainError::precondition(
                "payment cannot be decided on a completed request",
            ));
        }
        if self.payment_status == RequestPaymentStatus::Paid
            && cmd.decision == PaymentDecision::Debt
        {
            return Err(DomainError::conflict("request is already paid"));
        }

        Ok(vec![RequestEvent::PaymentDecided(PaymentDecided {
            request_id: cmd.request_id,
            decision: cmd.decision,
            actor_id: cmd.actor_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_paid(&self, cmd: &MarkRequestPaid) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_exists(cmd.request_id)?;

        if self.linked_invoice_id != Some(cmd.invoice_id) {
            return Err(DomainError::precondition(
                "invoice is not linked to this request",
            ));
        }
        if self.payment_status == RequestPaymentStatus::Paid {
            return Ok(Vec::new());
        }

        Ok(vec![RequestEvent::RequestMarkedPaid(RequestMarkedPaid {
            request_id: cmd.request_id,
            invoice_id: cmd.invoice_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkworks_events::execute;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn intake() -> SalesOrderRequest {
        let request_id = RequestId::generate();
        let mut request = SalesOrderRequest::empty(request_id);
        execute(
            &mut request,
            &RequestCommand::IntakeRequest(IntakeRequest {
                request_id,
                customer: CustomerIdentity {
                    name: "Harbor Cafe".to_string(),
                    phone: Some("+15550199".to_string()),
                    email: None,
                },
                description: "Menu boards, 4 pcs".to_string(),
                notes: None,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        request
    }

    fn link(request: &mut SalesOrderRequest, paid: bool) -> InvoiceId {
        let invoice_id = InvoiceId::generate();
        let request_id = request.id_typed();
        execute(
            request,
            &RequestCommand::LinkInvoice(LinkInvoice {
                request_id,
                invoice_id,
                invoice_has_real_number: true,
                invoice_fully_paid: paid,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        invoice_id
    }

    fn move_to(
        request: &mut SalesOrderRequest,
        target: FulfillmentStatus,
        assignee: Option<UserId>,
    ) -> Result<Vec<RequestEvent>, DomainError> {
        let request_id = request.id_typed();
        execute(
            request,
            &RequestCommand::TransitionRequest(TransitionRequest {
                request_id,
                target,
                assignee,
                actor_id: UserId::new(),
                occurred_at: test_time(),
            }),
        )
    }

    fn decide(
        request: &mut SalesOrderRequest,
        decision: PaymentDecision,
    ) -> Result<Vec<RequestEvent>, DomainError> {
        let request_id = request.id_typed();
        execute(
            request,
            &RequestCommand::DecidePayment(DecidePayment {
                request_id,
                decision,
                actor_id: UserId::new(),
                occurred_at: test_time(),
            }),
        )
    }

    #[test]
    fn intake_creates_pending_request() {
        let request = intake();
        assert_eq!(request.status(), FulfillmentStatus::Pending);
        assert_eq!(request.payment_status(), RequestPaymentStatus::Pending);
        assert_eq!(request.linked_invoice_id(), None);
        assert_eq!(request.processed_at(), None);
    }

    #[test]
    fn intake_requires_name_and_description() {
        let request_id = RequestId::generate();
        let empty = SalesOrderRequest::empty(request_id);
        let mk = |name: &str, description: &str| {
            RequestCommand::IntakeRequest(IntakeRequest {
                request_id,
                customer: CustomerIdentity {
                    name: name.to_string(),
                    ..CustomerIdentity::default()
                },
                description: description.to_string(),
                notes: None,
                occurred_at: test_time(),
            })
        };

        assert!(matches!(empty.handle(&mk(" ", "Stickers")), Err(DomainError::Validation(_))));
        assert!(matches!(empty.handle(&mk("Ann", "")), Err(DomainError::Validation(_))));
    }

    #[test]
    fn transition_without_invoice_is_gated_and_state_is_unchanged() {
        let mut request = intake();
        let before = request.clone();

        let err = move_to(&mut request, FulfillmentStatus::Processed, None).unwrap_err();

        assert_eq!(
            err,
            DomainError::InvoiceRequired {
                target_status: "processed".to_string()
            }
        );
        assert_eq!(request, before);
        assert_eq!(request.status(), FulfillmentStatus::Pending);
    }

    #[test]
    fn gate_clears_once_an_invoice_is_linked() {
        let mut request = intake();
        link(&mut request, false);

        move_to(&mut request, FulfillmentStatus::Processed, None).unwrap();

        assert_eq!(request.status(), FulfillmentStatus::Processed);
        assert!(request.processed_at().is_some());
    }

    #[test]
    fn table_violations_name_both_states() {
        let mut request = intake();
        link(&mut request, false);

        let err = move_to(&mut request, FulfillmentStatus::Printed, None).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: "pending".to_string(),
                to: "printed".to_string()
            }
        );

        let err = move_to(&mut request, FulfillmentStatus::Pending, None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn full_happy_path_with_assignments() {
        let designer = UserId::new();
        let operator = UserId::new();
        let mut request = intake();
        link(&mut request, false);

        move_to(&mut request, FulfillmentStatus::InDesign, Some(designer)).unwrap();
        assert_eq!(request.designer_id(), Some(designer));
        move_to(&mut request, FulfillmentStatus::DesignSubmitted, None).unwrap();
        let stamped_in_design = request.processed_at();

        decide(&mut request, PaymentDecision::Debt).unwrap();
        assert_eq!(request.payment_status(), RequestPaymentStatus::Debt);

        move_to(&mut request, FulfillmentStatus::InPrint, Some(operator)).unwrap();
        assert_eq!(request.print_operator_id(), Some(operator));
        assert!(request.processed_at() >= stamped_in_design);

        move_to(&mut request, FulfillmentStatus::Printed, None).unwrap();
        let events = move_to(&mut request, FulfillmentStatus::Completed, None).unwrap();
        assert_eq!(request.status(), FulfillmentStatus::Completed);
        match &events[0] {
            RequestEvent::RequestTransitioned(e) => {
                assert_eq!(e.from, FulfillmentStatus::Printed);
                assert_eq!(e.to, FulfillmentStatus::Completed);
            }
            _ => panic!("Expected RequestTransitioned event"),
        }
    }

    #[test]
    fn printing_requires_paid_or_debt() {
        let mut request = intake();
        link(&mut request, false);
        move_to(&mut request, FulfillmentStatus::Processed, None).unwrap();

        let err = move_to(&mut request, FulfillmentStatus::InPrint, Some(UserId::new())).unwrap_err();
        assert!(matches!(err, DomainError::PreconditionFailed(msg) if msg.contains("debt")));
        assert_eq!(request.status(), FulfillmentStatus::Processed);
    }

    #[test]
    fn linking_a_fully_paid_invoice_marks_request_paid() {
        let mut request = intake();
        link(&mut request, true);
        assert_eq!(request.payment_status(), RequestPaymentStatus::Paid);

        move_to(&mut request, FulfillmentStatus::Processed, None).unwrap();
        move_to(&mut request, FulfillmentStatus::InPrint, Some(UserId::new())).unwrap();
    }

    #[test]
    fn link_rejects_unnumbered_invoice_and_relinking() {
        let mut request = intake();
        let request_id = request.id_typed();
        let cmd = |numbered: bool| {
            RequestCommand::LinkInvoice(LinkInvoice {
                request_id,
                invoice_id: InvoiceId::generate(),
                invoice_has_real_number: numbered,
                invoice_fully_paid: false,
                occurred_at: test_time(),
            })
        };

        assert!(matches!(
            request.handle(&cmd(false)),
            Err(DomainError::PreconditionFailed(_))
        ));

        link(&mut request, false);
        assert!(matches!(request.handle(&cmd(true)), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn payment_decision_needs_invoice_and_progress() {
        let mut request = intake();
        assert!(matches!(
            decide(&mut request, PaymentDecision::Paid),
            Err(DomainError::PreconditionFailed(msg)) if msg.contains("link an invoice")
        ));

        link(&mut request, false);
        assert!(matches!(
            decide(&mut request, PaymentDecision::Paid),
            Err(DomainError::PreconditionFailed(msg)) if msg.contains("left pending")
        ));

        move_to(&mut request, FulfillmentStatus::Processed, None).unwrap();
        decide(&mut request, PaymentDecision::Paid).unwrap();
        assert_eq!(request.payment_status(), RequestPaymentStatus::Paid);

        assert!(matches!(
            decide(&mut request, PaymentDecision::Debt),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn payment_decision_is_refused_on_completed_request() {
        let mut request = intake();
        link(&mut request, true);
        move_to(&mut request, FulfillmentStatus::Processed, None).unwrap();
        move_to(&mut request, FulfillmentStatus::InPrint, Some(UserId::new())).unwrap();
        move_to(&mut request, FulfillmentStatus::Printed, None).unwrap();
        move_to(&mut request, FulfillmentStatus::Completed, None).unwrap();

        assert!(matches!(
            decide(&mut request, PaymentDecision::Paid),
            Err(DomainError::PreconditionFailed(msg)) if msg.contains("completed")
        ));
    }

    #[test]
    fn mark_paid_is_idempotent_and_checks_the_link() {
        let mut request = intake();
        let invoice_id = link(&mut request, false);
        let request_id = request.id_typed();

        let other = RequestCommand::MarkRequestPaid(MarkRequestPaid {
            request_id,
            invoice_id: InvoiceId::generate(),
            occurred_at: test_time(),
        });
        assert!(matches!(request.handle(&other), Err(DomainError::PreconditionFailed(_))));

        let cmd = RequestCommand::MarkRequestPaid(MarkRequestPaid {
            request_id,
            invoice_id,
            occurred_at: test_time(),
        });
        assert_eq!(execute(&mut request, &cmd).unwrap().len(), 1);
        assert_eq!(request.payment_status(), RequestPaymentStatus::Paid);
        assert!(execute(&mut request, &cmd).unwrap().is_empty());
    }
}
