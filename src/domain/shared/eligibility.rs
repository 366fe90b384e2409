use serde::{Deserialize, Serialize};

use super::account_type::AccountType;
use super::status::CustomerStatus;

// ============================================================================
// Account Eligibility Rules
// ============================================================================
//
// The four account-opening rules. Evaluated by the Customer service when
// answering CheckAccountLimit, and again by the Account service against its
// own store while it holds the per-customer creation lock.
//
// ============================================================================

/// Maximum number of accounts per customer; also the number of serials.
pub const MAX_ACCOUNTS_PER_CUSTOMER: u32 = 10;

/// What a customer currently holds, as counted by the Account service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHoldings {
    /// Every account ever opened, closed ones included (serials used).
    pub total_accounts: u32,
    /// Accounts that are not CLOSED.
    pub active_accounts: u32,
    /// Whether a non-closed SALARY account exists.
    pub has_salary_account: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    CustomerNotActive(CustomerStatus),
    ActiveLimitReached { active: u32, limit: u32 },
    SerialsExhausted { total: u32, limit: u32 },
    SalaryAccountExists,
}

impl Ineligibility {
    pub fn describe(&self) -> String {
        match self {
            Ineligibility::CustomerNotActive(status) => {
                format!("Customer is not active. Status: {}", status)
            }
            Ineligibility::ActiveLimitReached { limit, .. } => {
                format!("Customer has reached maximum active account limit of {}", limit)
            }
            Ineligibility::SerialsExhausted { limit, .. } => format!(
                "Customer has reached maximum total account limit (including closed accounts) of {}",
                limit
            ),
            Ineligibility::SalaryAccountExists => "Customer already has a salary account".to_string(),
        }
    }
}

/// Applies the rules in order: activity, active limit, serial space, salary uniqueness.
pub fn check_eligibility(
    status: CustomerStatus,
    holdings: &AccountHoldings,
    account_type: AccountType,
) -> Result<(), Ineligibility> {
    if !status.is_active() {
        return Err(Ineligibility::CustomerNotActive(status));
    }
    if holdings.active_accounts >= MAX_ACCOUNTS_PER_CUSTOMER {
        return Err(Ineligibility::ActiveLimitReached {
            active: holdings.active_accounts,
            limit: MAX_ACCOUNTS_PER_CUSTOMER,
        });
    }
    if holdings.total_accounts >= MAX_ACCOUNTS_PER_CUSTOMER {
        return Err(Ineligibility::SerialsExhausted {
            total: holdings.total_accounts,
            limit: MAX_ACCOUNTS_PER_CUSTOMER,
        });
    }
    if account_type.is_salary() && holdings.has_salary_account {
        return Err(Ineligibility::SalaryAccountExists);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::LifecycleStatus;

    fn holdings(total: u32, active: u32, salary: bool) -> AccountHoldings {
        AccountHoldings {
            total_accounts: total,
            active_accounts: active,
            has_salary_account: salary,
        }
    }

    #[test]
    fn test_fresh_customer_is_eligible() {
        assert!(check_eligibility(LifecycleStatus::Active, &holdings(0, 0, false), AccountType::Salary).is_ok());
    }

    #[test]
    fn test_inactive_customer_rejected_first() {
        let result = check_eligibility(LifecycleStatus::Suspended, &holdings(10, 10, true), AccountType::Salary);
        assert_eq!(result, Err(Ineligibility::CustomerNotActive(LifecycleStatus::Suspended)));
    }

    #[test]
    fn test_active_limit() {
        let result = check_eligibility(LifecycleStatus::Active, &holdings(10, 10, false), AccountType::Saving);
        assert!(matches!(result, Err(Ineligibility::ActiveLimitReached { active: 10, limit: 10 })));
    }

    #[test]
    fn test_closed_accounts_still_consume_serials() {
        let result = check_eligibility(LifecycleStatus::Active, &holdings(10, 3, false), AccountType::Saving);
        assert!(matches!(result, Err(Ineligibility::SerialsExhausted { total: 10, .. })));
    }

    #[test]
    fn test_second_salary_rejected_but_other_types_allowed() {
        let h = holdings(2, 2, true);
        assert_eq!(
            check_eligibility(LifecycleStatus::Active, &h, AccountType::Salary),
            Err(Ineligibility::SalaryAccountExists)
        );
        assert!(check_eligibility(LifecycleStatus::Active, &h, AccountType::Investment).is_ok());
    }
}
