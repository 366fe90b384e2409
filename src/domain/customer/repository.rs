use async_trait::async_trait;

use crate::domain::shared::CustomerNumber;
use crate::eventing::EventMetadata;

use super::aggregate::{Customer, NewCustomer};
use super::errors::CustomerError;
use super::events::CustomerEvent;
use super::value_objects::NationalId;

// ============================================================================
// Customer Repository
// ============================================================================

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Next number from the customer-number sequence.
    async fn next_customer_number(&self) -> Result<CustomerNumber, CustomerError>;

    /// Customer number and national id are both unique.
    async fn insert(
        &self,
        customer: NewCustomer,
        events: Vec<CustomerEvent>,
        meta: &EventMetadata,
    ) -> Result<Customer, CustomerError>;

    /// Compare-and-swap on `customer.version()`.
    async fn update(
        &self,
        customer: &Customer,
        events: Vec<CustomerEvent>,
        meta: &EventMetadata,
    ) -> Result<Customer, CustomerError>;

    async fn find_by_number(&self, customer_number: &CustomerNumber) -> Result<Option<Customer>, CustomerError>;

    async fn find_by_national_id(&self, national_id: &NationalId) -> Result<Option<Customer>, CustomerError>;

    /// Case-insensitive substring match on the full name.
    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Customer>, CustomerError>;
}
