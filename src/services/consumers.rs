use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::account::{AccountEvent, AccountNumber, Balance, ACCOUNT_TOPICS};
use crate::domain::customer::{CustomerEvent, CUSTOMER_TOPICS};
use crate::domain::shared::{AccountStatus, AccountType, CustomerNumber};
use crate::eventing::{deserialize_event, EventEnvelope};
use crate::messaging::{EventConsumer, PublishedEvent};

// ============================================================================
// Advisory Event Consumers
// ============================================================================
//
// Neither consumer is consulted when enforcing a rule. Both keep only the
// latest aggregate_version per aggregate: an event at or below it is a
// redelivery or arrived late, and is skipped.
//
// ============================================================================

/// Last known state of one account as seen through its events.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountActivity {
    pub account_type: Option<AccountType>,
    pub status: AccountStatus,
    pub balance: Option<Balance>,
    pub version: i64,
    pub last_event_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerActivity {
    pub accounts: BTreeMap<AccountNumber, AccountActivity>,
    pub transactions: u64,
}

impl CustomerActivity {
    pub fn open_accounts(&self) -> usize {
        self.accounts.values().filter(|a| !a.status.is_closed()).count()
    }
}

/// Customer-side view of account activity, fed by account events.
#[derive(Default)]
pub struct AccountActivityProjection {
    customers: DashMap<CustomerNumber, CustomerActivity>,
}

impl AccountActivityProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(&self, customer_number: &CustomerNumber) -> Option<CustomerActivity> {
        self.customers.get(customer_number).map(|entry| entry.value().clone())
    }

    /// Returns false when the account already holds this version or a newer one.
    pub fn apply(&self, envelope: &EventEnvelope<AccountEvent>) -> bool {
        let event = &envelope.event_data;
        let mut customer = self.customers.entry(event.customer_number().clone()).or_default();

        let stale = customer
            .accounts
            .get(event.account_number())
            .is_some_and(|known| known.version >= envelope.aggregate_version);
        if stale {
            tracing::debug!(
                event_id = %envelope.event_id,
                version = envelope.aggregate_version,
                "Skipping already applied account event"
            );
            return false;
        }

        if let AccountEvent::Transaction(_) = event {
            customer.transactions += 1;
        }

        let previous = customer.accounts.get(event.account_number()).cloned();
        let (account_type, status, balance) = match event {
            AccountEvent::Created(e) => (Some(e.account_type), e.status, Some(e.balance)),
            AccountEvent::StatusChanged(e) => (
                previous.as_ref().and_then(|p| p.account_type),
                e.new_status,
                previous.as_ref().and_then(|p| p.balance),
            ),
            AccountEvent::Closed(e) => (
                Some(e.account_type),
                AccountStatus::Closed,
                previous.as_ref().and_then(|p| p.balance),
            ),
            AccountEvent::Transaction(e) => (
                previous.as_ref().and_then(|p| p.account_type),
                previous.as_ref().map(|p| p.status).unwrap_or(AccountStatus::Active),
                Some(e.new_balance),
            ),
        };

        customer.accounts.insert(
            event.account_number().clone(),
            AccountActivity {
                account_type,
                status,
                balance,
                version: envelope.aggregate_version,
                last_event_at: envelope.timestamp,
            },
        );
        true
    }
}

#[async_trait]
impl EventConsumer for AccountActivityProjection {
    fn name(&self) -> &'static str {
        "customer-account-activity"
    }

    fn topics(&self) -> &'static [&'static str] {
        &ACCOUNT_TOPICS
    }

    async fn handle(&self, event: &PublishedEvent) -> anyhow::Result<()> {
        let envelope: EventEnvelope<AccountEvent> = deserialize_event(&event.payload)?;
        if self.apply(&envelope) {
            tracing::info!(
                event_type = %envelope.event_type,
                account_number = %envelope.event_data.account_number(),
                customer_number = %envelope.event_data.customer_number(),
                version = envelope.aggregate_version,
                "📥 Account event projected"
            );
        }
        Ok(())
    }
}

/// Account-side audit log of customer events.
#[derive(Default)]
pub struct CustomerEventLogger {
    versions: DashMap<CustomerNumber, i64>,
    logged: AtomicUsize,
}

impl CustomerEventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logged_count(&self) -> usize {
        self.logged.load(Ordering::Relaxed)
    }

    fn advance(&self, customer_number: &CustomerNumber, version: i64) -> bool {
        let mut latest = self.versions.entry(customer_number.clone()).or_insert(0);
        if *latest >= version {
            return false;
        }
        *latest = version;
        true
    }
}

#[async_trait]
impl EventConsumer for CustomerEventLogger {
    fn name(&self) -> &'static str {
        "account-customer-audit"
    }

    fn topics(&self) -> &'static [&'static str] {
        &CUSTOMER_TOPICS
    }

    async fn handle(&self, event: &PublishedEvent) -> anyhow::Result<()> {
        let envelope: EventEnvelope<CustomerEvent> = deserialize_event(&event.payload)?;
        if !self.advance(envelope.event_data.customer_number(), envelope.aggregate_version) {
            return Ok(());
        }
        self.logged.fetch_add(1, Ordering::Relaxed);
        match &envelope.event_data {
            CustomerEvent::StatusChanged(e) => tracing::info!(
                customer_number = %e.customer_number,
                previous_status = %e.previous_status,
                new_status = %e.new_status,
                "📥 Customer status changed"
            ),
            other => tracing::info!(
                event_type = %envelope.event_type,
                customer_number = %other.customer_number(),
                version = envelope.aggregate_version,
                "📥 Customer event received"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountCreated, AccountStatusChanged, AccountTransaction, TransactionKind};
    use crate::domain::customer::CustomerStatusChanged;
    use crate::domain::shared::CustomerStatus;
    use crate::eventing::{serialize_event, EventMetadata};

    fn account_number() -> AccountNumber {
        AccountNumber::parse("1234567001").unwrap()
    }

    fn customer_number() -> CustomerNumber {
        CustomerNumber::parse("1234567").unwrap()
    }

    fn created() -> EventEnvelope<AccountEvent> {
        EventEnvelope::new(
            "1234567001",
            1,
            AccountEvent::Created(AccountCreated {
                account_number: account_number(),
                customer_number: customer_number(),
                account_type: AccountType::Saving,
                balance: Balance::zero(),
                status: AccountStatus::Pending,
            }),
            &EventMetadata::default(),
        )
    }

    fn activated(version: i64) -> EventEnvelope<AccountEvent> {
        EventEnvelope::new(
            "1234567001",
            version,
            AccountEvent::StatusChanged(AccountStatusChanged {
                account_number: account_number(),
                customer_number: customer_number(),
                previous_status: AccountStatus::Pending,
                new_status: AccountStatus::Active,
                reason: None,
            }),
            &EventMetadata::default(),
        )
    }

    fn credited(version: i64, new_balance: &str) -> EventEnvelope<AccountEvent> {
        EventEnvelope::new(
            "1234567001",
            version,
            AccountEvent::Transaction(AccountTransaction {
                account_number: account_number(),
                customer_number: customer_number(),
                transaction_type: TransactionKind::Credit,
                amount: Balance::parse(new_balance).unwrap(),
                previous_balance: Balance::zero(),
                new_balance: Balance::parse(new_balance).unwrap(),
                description: None,
            }),
            &EventMetadata::default(),
        )
    }

    #[test]
    fn test_projection_follows_account_lifecycle() {
        let projection = AccountActivityProjection::new();
        projection.apply(&created());
        projection.apply(&activated(2));
        projection.apply(&credited(3, "100.5"));

        let activity = projection.activity(&customer_number()).unwrap();
        let account = &activity.accounts[&account_number()];
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.account_type, Some(AccountType::Saving));
        assert_eq!(account.balance, Some(Balance::parse("100.5").unwrap()));
        assert_eq!(account.version, 3);
        assert_eq!(activity.transactions, 1);
        assert_eq!(activity.open_accounts(), 1);
    }

    #[test]
    fn test_redelivered_event_is_applied_once() {
        let projection = AccountActivityProjection::new();
        let event = credited(2, "10");

        assert!(projection.apply(&event));
        assert!(!projection.apply(&event));

        assert_eq!(projection.activity(&customer_number()).unwrap().transactions, 1);
    }

    #[test]
    fn test_republished_copy_with_new_event_id_is_skipped() {
        let projection = AccountActivityProjection::new();
        assert!(projection.apply(&credited(2, "10")));
        assert!(!projection.apply(&credited(2, "10")));
        assert_eq!(projection.activity(&customer_number()).unwrap().transactions, 1);
    }

    #[test]
    fn test_long_event_stream_keeps_one_entry_per_account() {
        let projection = AccountActivityProjection::new();
        projection.apply(&created());
        for version in 2..=5000 {
            assert!(projection.apply(&credited(version, "1")));
        }

        assert_eq!(projection.customers.len(), 1);
        let activity = projection.activity(&customer_number()).unwrap();
        assert_eq!(activity.accounts.len(), 1);
        assert_eq!(activity.accounts[&account_number()].version, 5000);
        assert_eq!(activity.transactions, 4999);
    }

    #[test]
    fn test_older_version_does_not_overwrite_newer_state() {
        let projection = AccountActivityProjection::new();
        projection.apply(&created());
        projection.apply(&credited(3, "42"));
        projection.apply(&activated(2));

        let activity = projection.activity(&customer_number()).unwrap();
        let account = &activity.accounts[&account_number()];
        assert_eq!(account.version, 3);
        assert_eq!(account.balance, Some(Balance::parse("42").unwrap()));
    }

    #[tokio::test]
    async fn test_handle_parses_wire_payload() {
        let projection = AccountActivityProjection::new();
        let envelope = created();
        let wire = PublishedEvent {
            topic: envelope.topic().to_string(),
            key: envelope.aggregate_id.clone(),
            payload: serialize_event(&envelope).unwrap(),
        };

        projection.handle(&wire).await.unwrap();

        assert!(projection.activity(&customer_number()).is_some());
    }

    fn customer_status_event(version: i64) -> PublishedEvent {
        let envelope = EventEnvelope::new(
            "1234567",
            version,
            CustomerEvent::StatusChanged(CustomerStatusChanged {
                customer_number: customer_number(),
                previous_status: CustomerStatus::Pending,
                new_status: CustomerStatus::Active,
                reason: None,
            }),
            &EventMetadata::default(),
        );
        PublishedEvent {
            topic: envelope.topic().to_string(),
            key: envelope.aggregate_id.clone(),
            payload: serialize_event(&envelope).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_logger_tracks_latest_version_per_customer() {
        let logger = CustomerEventLogger::new();
        for version in 2..=500 {
            logger.handle(&customer_status_event(version)).await.unwrap();
        }
        logger.handle(&customer_status_event(500)).await.unwrap();
        logger.handle(&customer_status_event(3)).await.unwrap();

        assert_eq!(logger.logged_count(), 499);
        assert_eq!(logger.versions.len(), 1);
    }

    #[tokio::test]
    async fn test_handle_rejects_garbage_payload() {
        let logger = CustomerEventLogger::new();
        let wire = PublishedEvent {
            topic: "customer.events.created".into(),
            key: "1234567".into(),
            payload: "not json".into(),
        };
        assert!(logger.handle(&wire).await.is_err());
        assert_eq!(logger.logged_count(), 0);
    }
}
