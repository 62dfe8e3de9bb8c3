use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkworks_core::{Aggregate, AggregateRoot, DomainError, aggregate_id_type};
use inkworks_events::Event;

aggregate_id_type!(
    /// Customer identifier.
    CustomerId
);

/// Contact information for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Aggregate root: Customer.
///
/// Customers are only ever referenced once created; there is no delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    contact: ContactInfo,
    created_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Customer {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: CustomerId) -> Self {
        Self {
            id,
            name: String::new(),
            contact: ContactInfo::default(),
            created_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCustomer {
    pub customer_id: CustomerId,
    pub name: String,
    pub contact: Option<ContactInfo>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateCustomerDetails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCustomerDetails {
    pub customer_id: CustomerId,
    /// Optional new name (if None, keep existing).
    pub name: Option<String>,
    /// Optional new contact info (if None, keep existing).
    pub contact: Option<ContactInfo>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerCommand {
    RegisterCustomer(RegisterCustomer),
    UpdateCustomerDetails(UpdateCustomerDetails),
}

/// Event: CustomerRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistered {
    pub customer_id: CustomerId,
    pub name: String,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerDetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetailsUpdated {
    pub customer_id: CustomerId,
    pub name: String,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerEvent {
    CustomerRegistered(CustomerRegistered),
    CustomerDetailsUpdated(CustomerDetailsUpdated),
}

impl Event for CustomerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerRegistered(_) => "parties.customer.registered",
            CustomerEvent::CustomerDetailsUpdated(_) => "parties.customer.details_updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CustomerEvent::CustomerRegistered(e) => e.occurred_at,
            CustomerEvent::CustomerDetailsUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Customer {
    type Command = CustomerCommand;
    type Event = CustomerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CustomerEvent::CustomerRegistered(e) => {
                self.id = e.customer_id;
                self.name = e.name.clone();
                self.contact = e.contact.clone();
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            CustomerEvent::CustomerDetailsUpdated(e) => {
                self.name = e.name.clone();
                self.contact = e.contact.clone();
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CustomerCommand::RegisterCustomer(cmd) => self.handle_register(cmd),
            CustomerCommand::UpdateCustomerDetails(cmd) => self.handle_update(cmd),
        }
    }
}

impl Customer {
    fn ensure_customer_id(&self, customer_id: CustomerId) -> Result<(), DomainError> {
        if self.id != customer_id {
            return Err(DomainError::precondition("customer_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterCustomer) -> Result<Vec<CustomerEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("customer already exists"));
        }

        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }

        Ok(vec![CustomerEvent::CustomerRegistered(CustomerRegistered {
            customer_id: cmd.customer_id,
            name: name.to_string(),
            contact: cmd.contact.clone().unwrap_or_default(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(
        &self,
        cmd: &UpdateCustomerDetails,
    ) -> Result<Vec<CustomerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_customer_id(cmd.customer_id)?;

        let new_name = match &cmd.name {
            Some(n) => n.trim().to_string(),
            None => self.name.clone(),
        };
        if new_name.is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }

        let new_contact = cmd.contact.clone().unwrap_or_else(|| self.contact.clone());

        Ok(vec![CustomerEvent::CustomerDetailsUpdated(
            CustomerDetailsUpdated {
                customer_id: cmd.customer_id,
                name: new_name,
                contact: new_contact,
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}
