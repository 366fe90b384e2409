use chrono::{DateTime, Utc};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use crate::domain::shared::{AccountStatus, AccountType, CustomerNumber};
use crate::eventing::Aggregate;

use super::commands::AccountCommand;
use super::errors::AccountError;
use super::events::*;
use super::value_objects::{AccountNumber, Balance};

// ============================================================================
// Account Aggregate - Business Logic
// ============================================================================
//
// Two phases, two types: `NewAccount` has no surrogate id and cannot be
// mutated; `Account` is what the store hands back and is the only form
// that accepts commands.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewAccount {
    account_number: AccountNumber,
    account_type: AccountType,
    balance: Balance,
    status: AccountStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NewAccount {
    /// Always zero balance, always PENDING.
    pub fn open(account_number: AccountNumber, account_type: AccountType) -> Self {
        let now = Utc::now();
        Self {
            account_number,
            account_type,
            balance: Balance::zero(),
            status: AccountStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn account_number(&self) -> &AccountNumber {
        &self.account_number
    }

    pub fn customer_number(&self) -> CustomerNumber {
        self.account_number.customer_number()
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn created_event(&self) -> AccountEvent {
        AccountEvent::Created(AccountCreated {
            account_number: self.account_number.clone(),
            customer_number: self.customer_number(),
            account_type: self.account_type,
            balance: self.balance,
            status: self.status,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    id: Uuid,
    version: i64,
    account_number: AccountNumber,
    account_type: AccountType,
    balance: Balance,
    status: AccountStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: Uuid,
        version: i64,
        account_number: AccountNumber,
        account_type: AccountType,
        balance: Balance,
        status: AccountStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            version,
            account_number,
            account_type,
            balance,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn account_number(&self) -> &AccountNumber {
        &self.account_number
    }

    pub fn customer_number(&self) -> CustomerNumber {
        self.account_number.customer_number()
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn status(&self) -> AccountStatus {
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

    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    // Convenience wrappers around execute()

    pub fn credit(&mut self, amount: Balance) -> Result<Vec<AccountEvent>, AccountError> {
        self.execute(&AccountCommand::Credit { amount, description: None })
    }

    pub fn debit(&mut self, amount: Balance) -> Result<Vec<AccountEvent>, AccountError> {
        self.execute(&AccountCommand::Debit { amount, description: None })
    }

    pub fn activate(&mut self) -> Result<Vec<AccountEvent>, AccountError> {
        self.transition_to(AccountStatus::Active, None)
    }

    pub fn suspend(&mut self) -> Result<Vec<AccountEvent>, AccountError> {
        self.transition_to(AccountStatus::Suspended, None)
    }

    pub fn freeze(&mut self) -> Result<Vec<AccountEvent>, AccountError> {
        self.transition_to(AccountStatus::Frozen, None)
    }

    pub fn close(&mut self) -> Result<Vec<AccountEvent>, AccountError> {
        self.execute(&AccountCommand::Close { reason: None })
    }

    pub fn transition_to(
        &mut self,
        target: AccountStatus,
        reason: Option<String>,
    ) -> Result<Vec<AccountEvent>, AccountError> {
        self.execute(&AccountCommand::ChangeStatus { target, reason })
    }

    // Rule checks

    fn ensure_transactable(&self) -> Result<(), AccountError> {
        if !self.status.allows_transactions() {
            return Err(AccountError::AccountNotActive {
                account_number: self.account_number.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    fn ensure_transition(&self, target: AccountStatus) -> Result<(), AccountError> {
        if !self.status.can_transition_to(target) {
            return Err(AccountError::InvalidStatusTransition {
                account_number: self.account_number.clone(),
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }

    fn transaction(
        &self,
        transaction_type: TransactionKind,
        amount: Balance,
        new_balance: Balance,
        description: &Option<String>,
    ) -> AccountEvent {
        AccountEvent::Transaction(AccountTransaction {
            account_number: self.account_number.clone(),
            customer_number: self.customer_number(),
            transaction_type,
            amount,
            previous_balance: self.balance,
            new_balance,
            description: description.clone(),
        })
    }

    fn close_events(&self, reason: &Option<String>) -> Result<Vec<AccountEvent>, AccountError> {
        self.ensure_transition(AccountStatus::Closed)?;
        if !self.balance.is_zero() {
            return Err(AccountError::CannotCloseWithBalance {
                account_number: self.account_number.clone(),
                balance: self.balance,
            });
        }
        Ok(vec![AccountEvent::Closed(AccountClosed {
            account_number: self.account_number.clone(),
            customer_number: self.customer_number(),
            account_type: self.account_type,
            previous_status: self.status,
            reason: reason.clone(),
        })])
    }
}

fn ensure_positive(amount: Balance) -> Result<(), AccountError> {
    if !amount.is_positive() {
        return Err(AccountError::ZeroAmount);
    }
    Ok(())
}

impl Aggregate for Account {
    type Event = AccountEvent;
    type Command = AccountCommand;
    type Error = AccountError;

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AccountCommand::Credit { amount, description } => {
                self.ensure_transactable()?;
                ensure_positive(*amount)?;
                let new_balance = self.balance.checked_add(amount)?;
                Ok(vec![self.transaction(TransactionKind::Credit, *amount, new_balance, description)])
            }

            AccountCommand::Debit { amount, description } => {
                self.ensure_transactable()?;
                ensure_positive(*amount)?;
                if self.balance < *amount {
                    return Err(AccountError::InsufficientFunds {
                        account_number: self.account_number.clone(),
                        available: self.balance,
                        requested: *amount,
                    });
                }
                let new_balance = self.balance.checked_sub(amount)?;
                Ok(vec![self.transaction(TransactionKind::Debit, *amount, new_balance, description)])
            }

            AccountCommand::ChangeStatus { target, reason } => {
                if target.is_closed() {
                    return self.close_events(reason);
                }
                self.ensure_transition(*target)?;
                Ok(vec![AccountEvent::StatusChanged(AccountStatusChanged {
                    account_number: self.account_number.clone(),
                    customer_number: self.customer_number(),
                    previous_status: self.status,
                    new_status: *target,
                    reason: reason.clone(),
                })])
            }

            AccountCommand::Close { reason } => self.close_events(reason),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) {
        match event {
            AccountEvent::Created(e) => {
                self.status = e.status;
                self.balance = e.balance;
            }
            AccountEvent::StatusChanged(e) => {
                self.status = e.new_status;
            }
            AccountEvent::Closed(_) => {
                self.status = AccountStatus::Closed;
            }
            AccountEvent::Transaction(e) => {
                self.balance = e.new_balance;
            }
        }
        self.updated_at = Utc::now();
    }

    fn aggregate_id(&self) -> String {
        self.account_number.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

/// Identity is the account number alone.
impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.account_number == other.account_number
    }
}

impl Eq for Account {}

impl Hash for Account {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.account_number.hash(state);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
