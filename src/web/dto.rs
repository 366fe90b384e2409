use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::account::{Account, Balance};
use crate::domain::customer::Customer;
use crate::domain::shared::{AccountStatus, AccountType, CustomerStatus};
use crate::eventing::Aggregate;
use crate::services::CustomerActivity;

// ============================================================================
// Request / Response Bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub customer_number: String,
    pub account_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseQuery {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: String,
    pub national_id: String,
    pub customer_type: String,
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub customer_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_number: String,
    pub customer_number: String,
    pub account_type: AccountType,
    pub balance: Balance,
    pub status: AccountStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            account_number: account.account_number().to_string(),
            customer_number: account.customer_number().to_string(),
            account_type: account.account_type(),
            balance: account.balance(),
            status: account.status(),
            version: account.version(),
            created_at: account.created_at(),
            updated_at: account.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub customer_number: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub nationality_code: String,
    pub customer_type: String,
    pub address: String,
    pub status: CustomerStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerResponse {
    fn from(customer: &Customer) -> Self {
        Self {
            customer_number: customer.customer_number().to_string(),
            name: customer.name().to_string(),
            first_name: customer.name().first_name().to_string(),
            last_name: customer.name().last_name(),
            national_id: customer.national_id().to_string(),
            nationality_code: customer.national_id().nationality_code().to_string(),
            customer_type: customer.customer_type().to_string(),
            address: customer.address().to_string(),
            status: customer.status(),
            version: customer.version(),
            created_at: customer.created_at(),
            updated_at: customer.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountActivityResponse {
    pub account_number: String,
    pub account_type: Option<AccountType>,
    pub status: AccountStatus,
    pub balance: Option<Balance>,
    pub version: i64,
    pub last_event_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerActivityResponse {
    pub customer_number: String,
    pub open_accounts: usize,
    pub transactions: u64,
    pub accounts: Vec<AccountActivityResponse>,
}

impl CustomerActivityResponse {
    pub fn new(customer_number: &str, activity: &CustomerActivity) -> Self {
        Self {
            customer_number: customer_number.to_string(),
            open_accounts: activity.open_accounts(),
            transactions: activity.transactions,
            accounts: activity
                .accounts
                .iter()
                .map(|(number, account)| AccountActivityResponse {
                    account_number: number.to_string(),
                    account_type: account.account_type,
                    status: account.status,
                    balance: account.balance,
                    version: account.version,
                    last_event_at: account.last_event_at,
                })
                .collect(),
        }
    }
}
