use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountStatus, AccountType, CustomerNumber};
use crate::eventing::DomainEvent;

use super::value_objects::{AccountNumber, Balance};

// ============================================================================
// Account Domain Events
// ============================================================================

pub const TOPIC_ACCOUNT_CREATED: &str = "account.events.created";
pub const TOPIC_ACCOUNT_STATUS_CHANGED: &str = "account.events.status-changed";
pub const TOPIC_ACCOUNT_CLOSED: &str = "account.events.closed";
pub const TOPIC_ACCOUNT_TRANSACTION: &str = "account.events.transaction";

pub const ACCOUNT_TOPICS: [&str; 4] = [
    TOPIC_ACCOUNT_CREATED,
    TOPIC_ACCOUNT_STATUS_CHANGED,
    TOPIC_ACCOUNT_CLOSED,
    TOPIC_ACCOUNT_TRANSACTION,
];

/// Union type for all account events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AccountEvent {
    Created(AccountCreated),
    StatusChanged(AccountStatusChanged),
    Closed(AccountClosed),
    Transaction(AccountTransaction),
}

impl AccountEvent {
    pub fn account_number(&self) -> &AccountNumber {
        match self {
            AccountEvent::Created(e) => &e.account_number,
            AccountEvent::StatusChanged(e) => &e.account_number,
            AccountEvent::Closed(e) => &e.account_number,
            AccountEvent::Transaction(e) => &e.account_number,
        }
    }

    pub fn customer_number(&self) -> &CustomerNumber {
        match self {
            AccountEvent::Created(e) => &e.customer_number,
            AccountEvent::StatusChanged(e) => &e.customer_number,
            AccountEvent::Closed(e) => &e.customer_number,
            AccountEvent::Transaction(e) => &e.customer_number,
        }
    }
}

impl DomainEvent for AccountEvent {
    fn aggregate_type() -> &'static str {
        "Account"
    }

    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::Created(_) => "AccountCreated",
            AccountEvent::StatusChanged(_) => "AccountStatusChanged",
            AccountEvent::Closed(_) => "AccountClosed",
            AccountEvent::Transaction(_) => "AccountTransaction",
        }
    }

    fn topic(&self) -> &'static str {
        match self {
            AccountEvent::Created(_) => TOPIC_ACCOUNT_CREATED,
            AccountEvent::StatusChanged(_) => TOPIC_ACCOUNT_STATUS_CHANGED,
            AccountEvent::Closed(_) => TOPIC_ACCOUNT_CLOSED,
            AccountEvent::Transaction(_) => TOPIC_ACCOUNT_TRANSACTION,
        }
    }
}

// Individual event types

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub account_number: AccountNumber,
    pub customer_number: CustomerNumber,
    pub account_type: AccountType,
    pub balance: Balance,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStatusChanged {
    pub account_number: AccountNumber,
    pub customer_number: CustomerNumber,
    pub previous_status: AccountStatus,
    pub new_status: AccountStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountClosed {
    pub account_number: AccountNumber,
    pub customer_number: CustomerNumber,
    pub account_type: AccountType,
    pub previous_status: AccountStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Credit,
    Debit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTransaction {
    pub account_number: AccountNumber,
    pub customer_number: CustomerNumber,
    pub transaction_type: TransactionKind,
    pub amount: Balance,
    pub previous_balance: Balance,
    pub new_balance: Balance,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_event_wire_shape() {
        let event = AccountEvent::Transaction(AccountTransaction {
            account_number: AccountNumber::parse("1234567001").unwrap(),
            customer_number: CustomerNumber::parse("1234567").unwrap(),
            transaction_type: TransactionKind::Debit,
            amount: Balance::parse("50.25").unwrap(),
            previous_balance: Balance::parse("100.5").unwrap(),
            new_balance: Balance::parse("50.25").unwrap(),
            description: None,
        });

        assert_eq!(event.topic(), TOPIC_ACCOUNT_TRANSACTION);
        assert_eq!(event.event_type(), "AccountTransaction");

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Transaction");
        assert_eq!(json["data"]["transaction_type"], "DEBIT");
        assert_eq!(json["data"]["previous_balance"], "100.500");
        assert_eq!(json["data"]["new_balance"], "50.250");
    }

    #[test]
    fn test_every_variant_has_a_distinct_topic() {
        let mut topics = ACCOUNT_TOPICS.to_vec();
        topics.dedup();
        assert_eq!(topics.len(), 4);
    }
}
