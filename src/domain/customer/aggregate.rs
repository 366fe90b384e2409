use chrono::{DateTime, Utc};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use crate::domain::shared::{CustomerNumber, CustomerStatus};
use crate::eventing::Aggregate;

use super::commands::CustomerCommand;
use super::errors::CustomerError;
use super::events::*;
use super::value_objects::{Address, CustomerName, CustomerType, NationalId};

// ============================================================================
// Customer Aggregate - Business Logic
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewCustomer {
    customer_number: CustomerNumber,
    name: CustomerName,
    national_id: NationalId,
    customer_type: CustomerType,
    address: Address,
    status: CustomerStatus,
    created_at: DateTime<Utc>,
}

impl NewCustomer {
    pub fn register(
        customer_number: CustomerNumber,
        name: CustomerName,
        national_id: NationalId,
        customer_type: CustomerType,
        address: Address,
    ) -> Self {
        Self {
            customer_number,
            name,
            national_id,
            customer_type,
            address,
            status: CustomerStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn customer_number(&self) -> &CustomerNumber {
        &self.customer_number
    }

    pub fn name(&self) -> &CustomerName {
        &self.name
    }

    pub fn national_id(&self) -> &NationalId {
        &self.national_id
    }

    pub fn customer_type(&self) -> CustomerType {
        self.customer_type
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn status(&self) -> CustomerStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_event(&self) -> CustomerEvent {
        CustomerEvent::Created(CustomerCreated {
            customer_number: self.customer_number.clone(),
            name: self.name.clone(),
            national_id: self.national_id.clone(),
            customer_type: self.customer_type,
            address: self.address.clone(),
            status: self.status,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Customer {
    id: Uuid,
    version: i64,
    customer_number: CustomerNumber,
    name: CustomerName,
    national_id: NationalId,
    customer_type: CustomerType,
    address: Address,
    status: CustomerStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Customer {
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: Uuid,
        version: i64,
        customer_number: CustomerNumber,
        name: CustomerName,
        national_id: NationalId,
        customer_type: CustomerType,
        address: Address,
        status: CustomerStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            version,
            customer_number,
            name,
            national_id,
            customer_type,
            address,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn customer_number(&self) -> &CustomerNumber {
        &self.customer_number
    }

    pub fn name(&self) -> &CustomerName {
        &self.name
    }

    pub fn national_id(&self) -> &NationalId {
        &self.national_id
    }

    pub fn customer_type(&self) -> CustomerType {
        self.customer_type
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn status(&self) -> CustomerStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn update_details(
        &mut self,
        name: Option<CustomerName>,
        address: Option<Address>,
        customer_type: Option<CustomerType>,
    ) -> Result<Vec<CustomerEvent>, CustomerError> {
        self.execute(&CustomerCommand::UpdateDetails { name, address, customer_type })
    }

    pub fn transition_to(
        &mut self,
        target: CustomerStatus,
        reason: Option<String>,
    ) -> Result<Vec<CustomerEvent>, CustomerError> {
        self.execute(&CustomerCommand::ChangeStatus { target, reason })
    }

    pub fn activate(&mut self) -> Result<Vec<CustomerEvent>, CustomerError> {
        self.transition_to(CustomerStatus::Active, None)
    }

    pub fn suspend(&mut self) -> Result<Vec<CustomerEvent>, CustomerError> {
        self.transition_to(CustomerStatus::Suspended, None)
    }

    pub fn freeze(&mut self) -> Result<Vec<CustomerEvent>, CustomerError> {
        self.transition_to(CustomerStatus::Frozen, None)
    }

    pub fn close(&mut self) -> Result<Vec<CustomerEvent>, CustomerError> {
        self.transition_to(CustomerStatus::Closed, None)
    }

    fn ensure_operable(&self, operation: &'static str) -> Result<(), CustomerError> {
        if !self.status.allows_operations() {
            return Err(CustomerError::CannotPerformOperation {
                operation,
                customer_number: self.customer_number.clone(),
                status: self.status,
            });
        }
        Ok(())
    }
}

impl Aggregate for Customer {
    type Event = CustomerEvent;
    type Command = CustomerCommand;
    type Error = CustomerError;

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CustomerCommand::UpdateDetails { name, address, customer_type } => {
                self.ensure_operable("update")?;

                let mut changes = Vec::new();
                if let Some(name) = name.as_ref().filter(|n| **n != self.name) {
                    changes.push(format!("name: '{}' -> '{}'", self.name, name));
                }
                if let Some(address) = address.as_ref().filter(|a| **a != self.address) {
                    changes.push(format!("address: '{}' -> '{}'", self.address, address));
                }
                if let Some(customer_type) = customer_type.filter(|t| *t != self.customer_type) {
                    changes.push(format!("type: '{}' -> '{}'", self.customer_type, customer_type));
                }

                if changes.is_empty() {
                    return Err(CustomerError::NoUpdateFieldsProvided);
                }

                Ok(vec![CustomerEvent::Updated(CustomerUpdated {
                    customer_number: self.customer_number.clone(),
                    name: name.clone().unwrap_or_else(|| self.name.clone()),
                    customer_type: customer_type.unwrap_or(self.customer_type),
                    address: address.clone().unwrap_or_else(|| self.address.clone()),
                    changes,
                })])
            }

            CustomerCommand::ChangeStatus { target, reason } => {
                if !self.status.can_transition_to(*target) {
                    return Err(CustomerError::InvalidStatusTransition {
                        customer_number: self.customer_number.clone(),
                        from: self.status,
                        to: *target,
                    });
                }
                Ok(vec![CustomerEvent::StatusChanged(CustomerStatusChanged {
                    customer_number: self.customer_number.clone(),
                    previous_status: self.status,
                    new_status: *target,
                    reason: reason.clone(),
                })])
            }
        }
    }

    fn apply_event(&mut self, event: &Self::Event) {
        match event {
            CustomerEvent::Created(e) => {
                self.status = e.status;
            }
            CustomerEvent::Updated(e) => {
                self.name = e.name.clone();
                self.address = e.address.clone();
                self.customer_type = e.customer_type;
            }
            CustomerEvent::StatusChanged(e) => {
                self.status = e.new_status;
            }
        }
        self.updated_at = Utc::now();
    }

    fn aggregate_id(&self) -> String {
        self.customer_number.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl PartialEq for Customer {
    fn eq(&self, other: &Self) -> bool {
        self.customer_number == other.customer_number
    }
}

impl Eq for Customer {}

impl Hash for Customer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.customer_number.hash(state);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
