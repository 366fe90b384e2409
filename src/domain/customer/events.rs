use serde::{Deserialize, Serialize};

use crate::domain::shared::{CustomerNumber, CustomerStatus};
use crate::eventing::DomainEvent;

use super::value_objects::{Address, CustomerName, CustomerType, NationalId};

// ============================================================================
// Customer Domain Events
// ============================================================================

pub const TOPIC_CUSTOMER_CREATED: &str = "customer.events.created";
pub const TOPIC_CUSTOMER_UPDATED: &str = "customer.events.updated";
pub const TOPIC_CUSTOMER_STATUS_CHANGED: &str = "customer.events.status-changed";

pub const CUSTOMER_TOPICS: [&str; 3] = [
    TOPIC_CUSTOMER_CREATED,
    TOPIC_CUSTOMER_UPDATED,
    TOPIC_CUSTOMER_STATUS_CHANGED,
];

/// Union type for all customer events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CustomerEvent {
    Created(CustomerCreated),
    Updated(CustomerUpdated),
    StatusChanged(CustomerStatusChanged),
}

impl CustomerEvent {
    pub fn customer_number(&self) -> &CustomerNumber {
        match self {
            CustomerEvent::Created(e) => &e.customer_number,
            CustomerEvent::Updated(e) => &e.customer_number,
            CustomerEvent::StatusChanged(e) => &e.customer_number,
        }
    }
}

impl DomainEvent for CustomerEvent {
    fn aggregate_type() -> &'static str {
        "Customer"
    }

    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::Created(_) => "CustomerCreated",
            CustomerEvent::Updated(_) => "CustomerUpdated",
            CustomerEvent::StatusChanged(_) => "CustomerStatusChanged",
        }
    }

    fn topic(&self) -> &'static str {
        match self {
            CustomerEvent::Created(_) => TOPIC_CUSTOMER_CREATED,
            CustomerEvent::Updated(_) => TOPIC_CUSTOMER_UPDATED,
            CustomerEvent::StatusChanged(_) => TOPIC_CUSTOMER_STATUS_CHANGED,
        }
    }
}

// Individual event types

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCreated {
    pub customer_number: CustomerNumber,
    pub name: CustomerName,
    pub national_id: NationalId,
    pub customer_type: CustomerType,
    pub address: Address,
    pub status: CustomerStatus,
}

/// Carries the full post-update details plus a readable change list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerUpdated {
    pub customer_number: CustomerNumber,
    pub name: CustomerName,
    pub customer_type: CustomerType,
    pub address: Address,
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerStatusChanged {
    pub customer_number: CustomerNumber,
    pub previous_status: CustomerStatus,
    pub new_status: CustomerStatus,
    pub reason: Option<String>,
}
