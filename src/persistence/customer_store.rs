use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::customer::{
    Address, Customer, CustomerError, CustomerEvent, CustomerName, CustomerRepository, CustomerType, NationalId,
    NewCustomer,
};
use crate::domain::shared::{CustomerNumber, CustomerStatus};
use crate::eventing::{Aggregate, EventMetadata, OutboxMessage, OutboxSource};

use super::outbox_table::OutboxTable;

// ============================================================================
// In-Memory Customer Store
// ============================================================================
//
// Unique on customer number and on national id. Customer numbers come from
// a monotonic sequence that starts at a configurable seed.
//
// ============================================================================

#[derive(Debug, Clone)]
struct CustomerRow {
    id: Uuid,
    customer_number: String,
    name: String,
    national_id: String,
    customer_type: CustomerType,
    address: String,
    status_code: i16,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl CustomerRow {
    fn to_domain(&self) -> Result<Customer, CustomerError> {
        let corrupt = |reason: String| {
            CustomerError::Storage(format!("corrupt customer row '{}': {}", self.customer_number, reason))
        };
        Ok(Customer::reconstitute(
            self.id,
            self.version,
            CustomerNumber::parse(self.customer_number.as_str()).map_err(|e| corrupt(e.to_string()))?,
            CustomerName::parse(&self.name).map_err(|e| corrupt(e.to_string()))?,
            NationalId::parse(&self.national_id).map_err(|e| corrupt(e.to_string()))?,
            self.customer_type,
            Address::parse(&self.address).map_err(|e| corrupt(e.to_string()))?,
            CustomerStatus::from_code(self.status_code).map_err(|e| corrupt(e.to_string()))?,
            self.created_at,
            self.updated_at,
        ))
    }

    fn write(&mut self, customer: &Customer) {
        self.name = customer.name().as_str().to_string();
        self.customer_type = customer.customer_type();
        self.address = customer.address().as_str().to_string();
        self.status_code = customer.status().code();
        self.updated_at = customer.updated_at();
        if customer.status().is_closed() && self.closed_at.is_none() {
            self.closed_at = Some(customer.updated_at());
        }
    }
}

struct CustomerTables {
    customers: BTreeMap<String, CustomerRow>,
    /// national id -> customer number
    national_ids: HashMap<String, String>,
    next_sequence: u32,
    outbox: OutboxTable,
}

pub struct InMemoryCustomerStore {
    tables: Mutex<CustomerTables>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::with_sequence_start(1)
    }

    pub fn with_sequence_start(first: u32) -> Self {
        Self {
            tables: Mutex::new(CustomerTables {
                customers: BTreeMap::new(),
                national_ids: HashMap::new(),
                next_sequence: first,
                outbox: OutboxTable::default(),
            }),
        }
    }

    pub async fn pending_outbox_count(&self) -> usize {
        self.tables.lock().await.outbox.pending_count()
    }
}

impl Default for InMemoryCustomerStore {
    fn default() -> Self {
        Self::new()
    }
}

fn stage(aggregate_id: &str, version: i64, events: Vec<CustomerEvent>, meta: &EventMetadata) -> Result<Vec<OutboxMessage>, CustomerError> {
    OutboxTable::stage(aggregate_id, version, events, meta)
        .map_err(|e| CustomerError::Storage(format!("failed to serialize event: {}", e)))
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerStore {
    async fn next_customer_number(&self) -> Result<CustomerNumber, CustomerError> {
        let mut tables = self.tables.lock().await;
        let number = CustomerNumber::from_sequence(tables.next_sequence)
            .map_err(|_| CustomerError::Storage("customer number sequence exhausted".into()))?;
        tables.next_sequence += 1;
        Ok(number)
    }

    async fn insert(
        &self,
        customer: NewCustomer,
        events: Vec<CustomerEvent>,
        meta: &EventMetadata,
    ) -> Result<Customer, CustomerError> {
        let mut tables = self.tables.lock().await;
        let key = customer.customer_number().as_str().to_string();
        let national_id = customer.national_id().as_str().to_string();

        if tables.customers.contains_key(&key) {
            return Err(CustomerError::CustomerNumberAlreadyExists(customer.customer_number().clone()));
        }
        if tables.national_ids.contains_key(&national_id) {
            return Err(CustomerError::CustomerAlreadyExists(national_id));
        }

        let row = CustomerRow {
            id: Uuid::new_v4(),
            customer_number: key.clone(),
            name: customer.name().as_str().to_string(),
            national_id: national_id.clone(),
            customer_type: customer.customer_type(),
            address: customer.address().as_str().to_string(),
            status_code: customer.status().code(),
            version: 1,
            created_at: customer.created_at(),
            updated_at: customer.created_at(),
            closed_at: None,
        };
        let staged = stage(&key, row.version, events, meta)?;
        let stored = row.to_domain()?;

        tables.national_ids.insert(national_id, key.clone());
        tables.customers.insert(key, row);
        tables.outbox.append(staged);
        Ok(stored)
    }

    async fn update(
        &self,
        customer: &Customer,
        events: Vec<CustomerEvent>,
        meta: &EventMetadata,
    ) -> Result<Customer, CustomerError> {
        let mut tables = self.tables.lock().await;
        let key = customer.customer_number().as_str();

        let row = tables
            .customers
            .get(key)
            .ok_or_else(|| CustomerError::CustomerNotFound(customer.customer_number().clone()))?;
        if row.version != customer.version() {
            return Err(CustomerError::ConcurrentModification {
                customer_number: customer.customer_number().clone(),
                expected: customer.version(),
                actual: row.version,
            });
        }

        let mut next = row.clone();
        next.write(customer);
        next.version += 1;
        let staged = stage(key, next.version, events, meta)?;
        let stored = next.to_domain()?;

        tables.customers.insert(key.to_string(), next);
        tables.outbox.append(staged);
        Ok(stored)
    }

    async fn find_by_number(&self, customer_number: &CustomerNumber) -> Result<Option<Customer>, CustomerError> {
        let tables = self.tables.lock().await;
        tables
            .customers
            .get(customer_number.as_str())
            .map(CustomerRow::to_domain)
            .transpose()
    }

    async fn find_by_national_id(&self, national_id: &NationalId) -> Result<Option<Customer>, CustomerError> {
        let tables = self.tables.lock().await;
        tables
            .national_ids
            .get(national_id.as_str())
            .and_then(|number| tables.customers.get(number))
            .map(CustomerRow::to_domain)
            .transpose()
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Customer>, CustomerError> {
        let tables = self.tables.lock().await;
        let needle = fragment.trim().to_lowercase();
        tables
            .customers
            .values()
            .filter(|row| row.name.to_lowercase().contains(&needle))
            .map(CustomerRow::to_domain)
            .collect()
    }
}

#[async_trait]
impl OutboxSource for InMemoryCustomerStore {
    fn name(&self) -> &str {
        "customer"
    }

    async fn fetch_pending(&self, limit: usize) -> anyhow::Result<Vec<OutboxMessage>> {
        Ok(self.tables.lock().await.outbox.pending(limit))
    }

    async fn mark_published(&self, id: Uuid) -> anyhow::Result<()> {
        self.tables.lock().await.outbox.mark_published(id);
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: &str) -> anyhow::Result<u32> {
        self.tables
            .lock()
            .await
            .outbox
            .record_failure(id, error)
            .ok_or_else(|| anyhow::anyhow!("outbox message {} is not pending", id))
    }

    async fn mark_dead_lettered(&self, id: Uuid) -> anyhow::Result<()> {
        self.tables.lock().await.outbox.mark_dead_lettered(id);
        Ok(())
    }
}
