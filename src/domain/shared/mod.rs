// ============================================================================
// Shared Domain Vocabulary
// ============================================================================
//
// Types both services agree on: the customer number embedded in account
// numbers, the lifecycle state machine, account types, the error taxonomy
// and the account-opening rules.
//
// ============================================================================

pub mod account_type;
pub mod customer_number;
pub mod eligibility;
pub mod error_kind;
pub mod status;

pub use account_type::{AccountType, InvalidAccountType};
pub use customer_number::{CustomerNumber, InvalidCustomerNumber, CUSTOMER_NUMBER_LEN};
pub use eligibility::{check_eligibility, AccountHoldings, Ineligibility, MAX_ACCOUNTS_PER_CUSTOMER};
pub use error_kind::ErrorKind;
pub use status::{AccountStatus, CustomerStatus, LifecycleStatus, StatusParseError};
