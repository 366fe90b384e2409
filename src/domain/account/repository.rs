use async_trait::async_trait;

use crate::domain::shared::CustomerNumber;
use crate::eventing::EventMetadata;

use super::aggregate::{Account, NewAccount};
use super::errors::AccountError;
use super::events::AccountEvent;
use super::value_objects::AccountNumber;

// ============================================================================
// Account Repository
// ============================================================================
//
// Every write takes the events it produced; the store commits the row and
// the matching outbox entries together, stamping each envelope with the
// row version after the commit.
//
// ============================================================================

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `DuplicateAccountNumber` if the number is taken.
    async fn insert(
        &self,
        account: NewAccount,
        events: Vec<AccountEvent>,
        meta: &EventMetadata,
    ) -> Result<Account, AccountError>;

    /// Compare-and-swap on `account.version()`; fails with
    /// `ConcurrentModification` if the stored row moved on.
    async fn update(
        &self,
        account: &Account,
        events: Vec<AccountEvent>,
        meta: &EventMetadata,
    ) -> Result<Account, AccountError>;

    async fn find_by_number(&self, account_number: &AccountNumber) -> Result<Option<Account>, AccountError>;

    /// All accounts of a customer, closed ones included, in serial order.
    async fn find_by_customer(&self, customer_number: &CustomerNumber) -> Result<Vec<Account>, AccountError>;
}
