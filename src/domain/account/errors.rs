use crate::domain::shared::{
    AccountStatus, CustomerNumber, CustomerStatus, ErrorKind, InvalidAccountType, InvalidCustomerNumber,
    StatusParseError,
};
use crate::utils::IsTransient;

use super::value_objects::{AccountNumber, Balance, BalanceError, InvalidAccountNumber};

// ============================================================================
// Account Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccountError {
    // Not found
    #[error("Account with number '{0}' not found")]
    AccountNotFound(AccountNumber),

    #[error("Customer with number '{0}' not found")]
    CustomerNotFound(CustomerNumber),

    // Conflict
    #[error("Customer '{customer_number}' has reached the maximum limit of {limit} accounts")]
    AccountLimitExceeded { customer_number: CustomerNumber, limit: u32 },

    #[error("Customer '{customer_number}' already has a salary account{}", quoted_suffix(.existing_account))]
    SalaryAccountAlreadyExists {
        customer_number: CustomerNumber,
        existing_account: Option<AccountNumber>,
    },

    #[error("Account '{0}' already exists")]
    DuplicateAccountNumber(AccountNumber),

    #[error("Account '{account_number}' was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        account_number: AccountNumber,
        expected: i64,
        actual: i64,
    },

    // Invalid state
    #[error("Customer '{customer_number}' is not active. Current status: {status}")]
    CustomerNotActive {
        customer_number: CustomerNumber,
        status: CustomerStatus,
    },

    #[error("Account '{account_number}' is not active. Current status: {status}")]
    AccountNotActive {
        account_number: AccountNumber,
        status: AccountStatus,
    },

    #[error("Account '{account_number}' cannot transition from '{from}' to '{to}'")]
    InvalidStatusTransition {
        account_number: AccountNumber,
        from: AccountStatus,
        to: AccountStatus,
    },

    #[error("Cannot close account '{account_number}' with remaining balance {balance}")]
    CannotCloseWithBalance {
        account_number: AccountNumber,
        balance: Balance,
    },

    // Insufficient funds
    #[error("Insufficient funds in account '{account_number}'. Available: {available}, Required: {requested}")]
    InsufficientFunds {
        account_number: AccountNumber,
        available: Balance,
        requested: Balance,
    },

    // Invalid data
    #[error(transparent)]
    InvalidAccountNumber(#[from] InvalidAccountNumber),

    #[error(transparent)]
    InvalidCustomerNumber(#[from] InvalidCustomerNumber),

    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount { value: String, reason: String },

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error(transparent)]
    InvalidAccountType(#[from] InvalidAccountType),

    #[error(transparent)]
    InvalidStatus(#[from] StatusParseError),

    #[error("Required field '{0}' is missing")]
    MissingRequiredField(&'static str),

    // Unavailable
    #[error("Cannot verify customer '{customer_number}': {reason}")]
    CustomerVerificationUnavailable {
        customer_number: CustomerNumber,
        reason: String,
    },

    #[error("Storage failure: {0}")]
    Storage(String),
}

fn quoted_suffix(account: &Option<AccountNumber>) -> String {
    account.as_ref().map(|a| format!(" '{}'", a)).unwrap_or_default()
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::AccountNotFound(_) | AccountError::CustomerNotFound(_) => ErrorKind::NotFound,

            AccountError::AccountLimitExceeded { .. }
            | AccountError::SalaryAccountAlreadyExists { .. }
            | AccountError::DuplicateAccountNumber(_)
            | AccountError::ConcurrentModification { .. } => ErrorKind::Conflict,

            AccountError::CustomerNotActive { .. }
            | AccountError::AccountNotActive { .. }
            | AccountError::InvalidStatusTransition { .. }
            | AccountError::CannotCloseWithBalance { .. } => ErrorKind::InvalidState,

            AccountError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,

            AccountError::InvalidAccountNumber(_)
            | AccountError::InvalidCustomerNumber(_)
            | AccountError::InvalidAmount { .. }
            | AccountError::ZeroAmount
            | AccountError::InvalidAccountType(_)
            | AccountError::InvalidStatus(_)
            | AccountError::MissingRequiredField(_) => ErrorKind::InvalidData,

            AccountError::CustomerVerificationUnavailable { .. } | AccountError::Storage(_) => ErrorKind::Unavailable,
        }
    }

    /// Stable code rendered in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            AccountError::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            AccountError::AccountLimitExceeded { .. } => "ACCOUNT_LIMIT_EXCEEDED",
            AccountError::SalaryAccountAlreadyExists { .. } => "SALARY_ACCOUNT_ALREADY_EXISTS",
            AccountError::DuplicateAccountNumber(_) => "DUPLICATE_ACCOUNT_NUMBER",
            AccountError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            AccountError::CustomerNotActive { .. } => "INVALID_CUSTOMER_STATE",
            AccountError::AccountNotActive { .. }
            | AccountError::InvalidStatusTransition { .. }
            | AccountError::CannotCloseWithBalance { .. } => "INVALID_ACCOUNT_STATE",
            AccountError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            AccountError::InvalidAccountNumber(_)
            | AccountError::InvalidCustomerNumber(_)
            | AccountError::InvalidAmount { .. }
            | AccountError::ZeroAmount
            | AccountError::InvalidAccountType(_)
            | AccountError::InvalidStatus(_)
            | AccountError::MissingRequiredField(_) => "INVALID_ACCOUNT_DATA",
            AccountError::CustomerVerificationUnavailable { .. } => "CUSTOMER_SERVICE_UNAVAILABLE",
            AccountError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<BalanceError> for AccountError {
    fn from(err: BalanceError) -> Self {
        let value = match &err {
            BalanceError::Negative(v) => v.to_string(),
            BalanceError::Unparseable(v) => v.clone(),
            BalanceError::Overflow => String::new(),
        };
        AccountError::InvalidAmount { value, reason: err.to_string() }
    }
}

/// Only a lost optimistic-concurrency race is worth retrying.
impl IsTransient for AccountError {
    fn is_transient(&self) -> bool {
        matches!(self, AccountError::ConcurrentModification { .. })
    }
}
