use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::account::{holdings_of, Account, AccountNumber, Balance, BalanceError};
use crate::domain::customer::{Address, Customer, CustomerName, CustomerType, NationalId};
use crate::domain::shared::{
    AccountHoldings, AccountStatus, AccountType, CustomerNumber, CustomerStatus, Ineligibility,
    MAX_ACCOUNTS_PER_CUSTOMER,
};
use crate::utils::IsTransient;

use super::context::CallContext;

// ============================================================================
// Cross-Service Contracts
// ============================================================================
//
// Account -> Customer: identity and limit checks.
// Customer -> Account: account summaries used to answer limit checks.
//
// Transport failures are RpcError; business answers are response values.
// A caller must never treat an RpcError as a positive answer.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("{0} is unavailable (circuit open)")]
    Unavailable(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote failure: {0}")]
    Remote(String),
}

impl IsTransient for RpcError {
    fn is_transient(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }
}

// ============================================================================
// Customer service surface
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCustomerResponse {
    pub is_valid: bool,
    pub is_active: bool,
    pub status: Option<CustomerStatus>,
    pub error_message: Option<String>,
}

impl ValidateCustomerResponse {
    pub fn found(status: CustomerStatus) -> Self {
        Self {
            is_valid: true,
            is_active: status.is_active(),
            status: Some(status),
            error_message: None,
        }
    }

    pub fn not_found(customer_number: &CustomerNumber) -> Self {
        Self {
            is_valid: false,
            is_active: false,
            status: None,
            error_message: Some(format!("Customer with number '{}' not found", customer_number)),
        }
    }
}

/// Structured reason for a negative limit answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitDenial {
    CustomerNotFound,
    CustomerNotActive(CustomerStatus),
    ActiveLimitReached,
    SerialsExhausted,
    SalaryAccountExists,
}

impl From<&Ineligibility> for LimitDenial {
    fn from(value: &Ineligibility) -> Self {
        match value {
            Ineligibility::CustomerNotActive(status) => LimitDenial::CustomerNotActive(*status),
            Ineligibility::ActiveLimitReached { .. } => LimitDenial::ActiveLimitReached,
            Ineligibility::SerialsExhausted { .. } => LimitDenial::SerialsExhausted,
            Ineligibility::SalaryAccountExists => LimitDenial::SalaryAccountExists,
        }
    }
}

/// Counts are absent when the answer was reached without looking at the
/// customer's accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAccountLimitResponse {
    pub can_create_account: bool,
    pub current_account_count: Option<u32>,
    pub max_account_limit: u32,
    pub already_has_salary_account: Option<bool>,
    pub existing_salary_account: Option<AccountNumber>,
    pub error_message: Option<String>,
    pub denial: Option<LimitDenial>,
}

impl CheckAccountLimitResponse {
    pub fn allowed(holdings: &AccountHoldings) -> Self {
        Self {
            can_create_account: true,
            current_account_count: Some(holdings.active_accounts),
            max_account_limit: MAX_ACCOUNTS_PER_CUSTOMER,
            already_has_salary_account: Some(holdings.has_salary_account),
            existing_salary_account: None,
            error_message: None,
            denial: None,
        }
    }

    pub fn denied(holdings: &AccountHoldings, reason: &Ineligibility) -> Self {
        Self {
            can_create_account: false,
            error_message: Some(reason.describe()),
            denial: Some(LimitDenial::from(reason)),
            ..Self::allowed(holdings)
        }
    }

    pub fn not_active(status: CustomerStatus) -> Self {
        let reason = Ineligibility::CustomerNotActive(status);
        Self {
            can_create_account: false,
            current_account_count: None,
            max_account_limit: MAX_ACCOUNTS_PER_CUSTOMER,
            already_has_salary_account: None,
            existing_salary_account: None,
            error_message: Some(reason.describe()),
            denial: Some(LimitDenial::from(&reason)),
        }
    }

    pub fn customer_not_found(customer_number: &CustomerNumber) -> Self {
        Self {
            can_create_account: false,
            current_account_count: None,
            max_account_limit: MAX_ACCOUNTS_PER_CUSTOMER,
            already_has_salary_account: None,
            existing_salary_account: None,
            error_message: Some(format!("Customer with number '{}' not found", customer_number)),
            denial: Some(LimitDenial::CustomerNotFound),
        }
    }

    pub fn with_salary_account(mut self, account_number: Option<AccountNumber>) -> Self {
        self.existing_salary_account = account_number;
        self
    }
}

/// Read-only view of a customer handed to the other service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProjection {
    pub customer_number: CustomerNumber,
    pub name: CustomerName,
    pub national_id: NationalId,
    pub customer_type: CustomerType,
    pub address: Address,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerProjection {
    fn from(customer: &Customer) -> Self {
        Self {
            customer_number: customer.customer_number().clone(),
            name: customer.name().clone(),
            national_id: customer.national_id().clone(),
            customer_type: customer.customer_type(),
            address: customer.address().clone(),
            status: customer.status(),
            created_at: customer.created_at(),
            updated_at: customer.updated_at(),
        }
    }
}

#[async_trait]
pub trait CustomerGateway: Send + Sync {
    async fn validate_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<ValidateCustomerResponse, RpcError>;

    async fn check_account_limit(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        account_type: AccountType,
    ) -> Result<CheckAccountLimitResponse, RpcError>;

    async fn get_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<Option<CustomerProjection>, RpcError>;
}

// ============================================================================
// Account service surface
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub account_number: AccountNumber,
    pub customer_number: CustomerNumber,
    pub account_type: AccountType,
    pub status: AccountStatus,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            account_number: account.account_number().clone(),
            customer_number: account.customer_number(),
            account_type: account.account_type(),
            status: account.status(),
            balance: account.balance(),
            created_at: account.created_at(),
            updated_at: account.updated_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub customer_number: CustomerNumber,
    /// Every account ever opened, closed ones included.
    pub total_accounts: u32,
    /// Accounts that are not CLOSED.
    pub active_accounts: u32,
    /// A non-closed SALARY account exists.
    pub has_salary_account: bool,
    pub total_balance: Balance,
    pub account_details: Vec<AccountInfo>,
}

impl AccountSummary {
    pub fn from_accounts(customer_number: CustomerNumber, accounts: &[Account]) -> Result<Self, BalanceError> {
        let holdings = holdings_of(accounts);
        let total: Decimal = accounts.iter().map(|a| a.balance().value()).sum();

        Ok(Self {
            customer_number,
            total_accounts: holdings.total_accounts,
            active_accounts: holdings.active_accounts,
            has_salary_account: holdings.has_salary_account,
            total_balance: Balance::new(total)?,
            account_details: accounts.iter().map(AccountInfo::from).collect(),
        })
    }

    pub fn holdings(&self) -> AccountHoldings {
        AccountHoldings {
            total_accounts: self.total_accounts,
            active_accounts: self.active_accounts,
            has_salary_account: self.has_salary_account,
        }
    }

    /// The non-closed SALARY account, if any.
    pub fn salary_account(&self) -> Option<&AccountNumber> {
        self.account_details
            .iter()
            .find(|a| a.account_type.is_salary() && !a.status.is_closed())
            .map(|a| &a.account_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAccounts {
    pub has_active_accounts: bool,
    pub active_account_count: u32,
    pub active_account_numbers: Vec<AccountNumber>,
}

impl ActiveAccounts {
    /// Counts accounts whose status is exactly ACTIVE.
    pub fn from_accounts(accounts: &[Account]) -> Self {
        let numbers: Vec<AccountNumber> = accounts
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.account_number().clone())
            .collect();
        Self {
            has_active_accounts: !numbers.is_empty(),
            active_account_count: numbers.len() as u32,
            active_account_numbers: numbers,
        }
    }
}

#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn get_account_summary(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<AccountSummary, RpcError>;

    async fn get_accounts_by_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<Vec<AccountInfo>, RpcError>;

    async fn has_active_accounts(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<ActiveAccounts, RpcError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Serial;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn account(serial: u16, account_type: AccountType, status: AccountStatus, balance: Decimal) -> Account {
        let customer = CustomerNumber::parse("1234567").unwrap();
        let number = AccountNumber::compose(&customer, Serial::new(serial).unwrap());
        let now = Utc::now();
        Account::reconstitute(
            Uuid::new_v4(),
            1,
            number,
            account_type,
            Balance::new(balance).unwrap(),
            status,
            now,
            now,
        )
    }

    #[test]
    fn test_summary_counts_closed_toward_total_only() {
        let accounts = vec![
            account(1, AccountType::Saving, AccountStatus::Active, dec!(10.5)),
            account(2, AccountType::Salary, AccountStatus::Closed, dec!(0)),
            account(3, AccountType::Investment, AccountStatus::Suspended, dec!(2.25)),
        ];
        let summary = AccountSummary::from_accounts(CustomerNumber::parse("1234567").unwrap(), &accounts).unwrap();

        assert_eq!(summary.total_accounts, 3);
        assert_eq!(summary.active_accounts, 2);
        assert!(!summary.has_salary_account);
        assert_eq!(summary.total_balance.to_string(), "12.750");
        assert_eq!(summary.account_details.len(), 3);
    }

    #[test]
    fn test_suspended_salary_still_counts() {
        let accounts = vec![account(1, AccountType::Salary, AccountStatus::Suspended, dec!(0))];
        let summary = AccountSummary::from_accounts(CustomerNumber::parse("1234567").unwrap(), &accounts).unwrap();
        assert!(summary.holdings().has_salary_account);
    }

    #[test]
    fn test_salary_account_skips_closed_ones() {
        let accounts = vec![
            account(1, AccountType::Salary, AccountStatus::Closed, dec!(0)),
            account(2, AccountType::Saving, AccountStatus::Active, dec!(0)),
            account(3, AccountType::Salary, AccountStatus::Active, dec!(0)),
        ];
        let summary = AccountSummary::from_accounts(CustomerNumber::parse("1234567").unwrap(), &accounts).unwrap();
        assert_eq!(summary.salary_account().map(|n| n.as_str()), Some("1234567003"));
    }

    #[test]
    fn test_active_accounts_only_lists_active_status() {
        let accounts = vec![
            account(1, AccountType::Saving, AccountStatus::Active, dec!(0)),
            account(2, AccountType::Saving, AccountStatus::Pending, dec!(0)),
        ];
        let active = ActiveAccounts::from_accounts(&accounts);
        assert!(active.has_active_accounts);
        assert_eq!(active.active_account_count, 1);
        assert_eq!(active.active_account_numbers[0].as_str(), "1234567001");
    }

    #[test]
    fn test_denied_limit_response_carries_reason() {
        let holdings = AccountHoldings { total_accounts: 3, active_accounts: 3, has_salary_account: true };
        let response = CheckAccountLimitResponse::denied(&holdings, &Ineligibility::SalaryAccountExists);

        assert!(!response.can_create_account);
        assert_eq!(response.denial, Some(LimitDenial::SalaryAccountExists));
        assert_eq!(response.max_account_limit, 10);
        assert_eq!(response.already_has_salary_account, Some(true));
        assert_eq!(response.error_message.as_deref(), Some("Customer already has a salary account"));
    }

    #[test]
    fn test_not_active_answer_leaves_counts_unknown() {
        let response = CheckAccountLimitResponse::not_active(CustomerStatus::Suspended);

        assert!(!response.can_create_account);
        assert_eq!(response.denial, Some(LimitDenial::CustomerNotActive(CustomerStatus::Suspended)));
        assert_eq!(response.current_account_count, None);
        assert_eq!(response.already_has_salary_account, None);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["currentAccountCount"].is_null());
        assert_eq!(json["denial"]["CUSTOMER_NOT_ACTIVE"], "SUSPENDED");
    }

    #[test]
    fn test_only_transport_errors_are_retried() {
        assert!(RpcError::Transport("reset".into()).is_transient());
        assert!(!RpcError::Timeout { operation: "validate_customer" }.is_transient());
        assert!(!RpcError::Unavailable("customer-rpc".into()).is_transient());
        assert!(!RpcError::Remote("boom".into()).is_transient());
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let json = serde_json::to_value(ValidateCustomerResponse::found(CustomerStatus::Active)).unwrap();
        assert_eq!(json["isValid"], true);
        assert_eq!(json["isActive"], true);
        assert_eq!(json["status"], "ACTIVE");
    }
}
