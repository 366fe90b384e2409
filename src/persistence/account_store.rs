use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::account::{
    Account, AccountError, AccountEvent, AccountNumber, AccountRepository, Balance, NewAccount,
};
use crate::domain::shared::{AccountStatus, AccountType, CustomerNumber};
use crate::eventing::{Aggregate, EventMetadata, OutboxMessage, OutboxSource};

use super::outbox_table::OutboxTable;

// ============================================================================
// In-Memory Account Store
// ============================================================================
//
// Rows are kept in their persisted shape (status code, scaled decimal,
// row version, soft-delete marker) and converted at the boundary.
// The account row and its outbox entries are written under one lock.
//
// ============================================================================

#[derive(Debug, Clone)]
struct AccountRow {
    id: Uuid,
    account_number: String,
    account_type: AccountType,
    balance: Decimal,
    status_code: i16,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Set when the account is closed; rows are never deleted.
    closed_at: Option<DateTime<Utc>>,
}

impl AccountRow {
    fn to_domain(&self) -> Result<Account, AccountError> {
        let corrupt = |reason: String| {
            AccountError::Storage(format!("corrupt account row '{}': {}", self.account_number, reason))
        };
        Ok(Account::reconstitute(
            self.id,
            self.version,
            AccountNumber::parse(&self.account_number).map_err(|e| corrupt(e.to_string()))?,
            self.account_type,
            Balance::new(self.balance).map_err(|e| corrupt(e.to_string()))?,
            AccountStatus::from_code(self.status_code).map_err(|e| corrupt(e.to_string()))?,
            self.created_at,
            self.updated_at,
        ))
    }

    fn write(&mut self, account: &Account) {
        self.balance = account.balance().value();
        self.status_code = account.status().code();
        self.updated_at = account.updated_at();
        if account.is_closed() && self.closed_at.is_none() {
            self.closed_at = Some(account.updated_at());
        }
    }
}

#[derive(Default)]
struct AccountTables {
    /// Keyed by account number; customer prefix scans use range queries.
    accounts: BTreeMap<String, AccountRow>,
    outbox: OutboxTable,
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    tables: Mutex<AccountTables>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pending_outbox_count(&self) -> usize {
        self.tables.lock().await.outbox.pending_count()
    }

    pub async fn published_outbox_count(&self) -> u64 {
        self.tables.lock().await.outbox.published_count()
    }

    /// When the account was closed, if it was.
    pub async fn closed_at(&self, account_number: &AccountNumber) -> Option<DateTime<Utc>> {
        self.tables
            .lock()
            .await
            .accounts
            .get(account_number.as_str())
            .and_then(|row| row.closed_at)
    }
}

fn stage(aggregate_id: &str, version: i64, events: Vec<AccountEvent>, meta: &EventMetadata) -> Result<Vec<OutboxMessage>, AccountError> {
    OutboxTable::stage(aggregate_id, version, events, meta)
        .map_err(|e| AccountError::Storage(format!("failed to serialize event: {}", e)))
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn insert(
        &self,
        account: NewAccount,
        events: Vec<AccountEvent>,
        meta: &EventMetadata,
    ) -> Result<Account, AccountError> {
        let mut tables = self.tables.lock().await;
        let key = account.account_number().as_str().to_string();
        if tables.accounts.contains_key(&key) {
            return Err(AccountError::DuplicateAccountNumber(account.account_number().clone()));
        }

        let row = AccountRow {
            id: Uuid::new_v4(),
            account_number: key.clone(),
            account_type: account.account_type(),
            balance: account.balance().value(),
            status_code: account.status().code(),
            version: 1,
            created_at: account.created_at(),
            updated_at: account.updated_at(),
            closed_at: None,
        };
        let staged = stage(&key, row.version, events, meta)?;
        let stored = row.to_domain()?;

        tables.accounts.insert(key, row);
        tables.outbox.append(staged);

        tracing::debug!(
            account_number = %stored.account_number(),
            version = stored.version(),
            "Inserted account row"
        );
        Ok(stored)
    }

    async fn update(
        &self,
        account: &Account,
        events: Vec<AccountEvent>,
        meta: &EventMetadata,
    ) -> Result<Account, AccountError> {
        let mut tables = self.tables.lock().await;
        let key = account.account_number().as_str();

        let row = tables
            .accounts
            .get(key)
            .ok_or_else(|| AccountError::AccountNotFound(account.account_number().clone()))?;
        if row.version != account.version() {
            return Err(AccountError::ConcurrentModification {
                account_number: account.account_number().clone(),
                expected: account.version(),
                actual: row.version,
            });
        }

        let mut next = row.clone();
        next.write(account);
        next.version += 1;
        let staged = stage(key, next.version, events, meta)?;
        let stored = next.to_domain()?;

        tables.accounts.insert(key.to_string(), next);
        tables.outbox.append(staged);
        Ok(stored)
    }

    async fn find_by_number(&self, account_number: &AccountNumber) -> Result<Option<Account>, AccountError> {
        let tables = self.tables.lock().await;
        tables
            .accounts
            .get(account_number.as_str())
            .map(AccountRow::to_domain)
            .transpose()
    }

    async fn find_by_customer(&self, customer_number: &CustomerNumber) -> Result<Vec<Account>, AccountError> {
        let tables = self.tables.lock().await;
        let from = format!("{}000", customer_number);
        let to = format!("{}999", customer_number);
        tables
            .accounts
            .range(from..=to)
            .map(|(_, row)| row.to_domain())
            .collect()
    }
}

#[async_trait]
impl OutboxSource for InMemoryAccountStore {
    fn name(&self) -> &str {
        "account"
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
