use crate::domain::shared::{AccountHoldings, CustomerNumber, MAX_ACCOUNTS_PER_CUSTOMER};

use super::aggregate::Account;
use super::errors::AccountError;
use super::value_objects::{AccountNumber, Serial};

// ============================================================================
// Account Number Allocator
// ============================================================================
//
// Lowest free serial in 001..=010. Serials of closed accounts stay taken.
// Not atomic on its own: callers hold the per-customer creation lock and
// the store enforces uniqueness on insert.
//
// ============================================================================

pub fn next_account_number<S: AsRef<str>>(
    customer_number: &CustomerNumber,
    existing_serials: &[S],
) -> Result<AccountNumber, AccountError> {
    let candidate = (1..=MAX_ACCOUNTS_PER_CUSTOMER as u16)
        .filter_map(Serial::new)
        .find(|serial| {
            let text = serial.to_string();
            !existing_serials.iter().any(|used| used.as_ref() == text)
        });

    match candidate {
        Some(serial) => Ok(AccountNumber::compose(customer_number, serial)),
        None => Err(AccountError::AccountLimitExceeded {
            customer_number: customer_number.clone(),
            limit: MAX_ACCOUNTS_PER_CUSTOMER,
        }),
    }
}

/// Counts a customer's accounts the way the opening rules need them.
pub fn holdings_of(accounts: &[Account]) -> AccountHoldings {
    let open = accounts.iter().filter(|a| !a.is_closed());
    let (mut active, mut salary) = (0u32, false);
    for account in open {
        active += 1;
        salary |= account.account_type().is_salary();
    }
    AccountHoldings {
        total_accounts: accounts.len() as u32,
        active_accounts: active,
        has_salary_account: salary,
    }
}
