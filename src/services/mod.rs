// ============================================================================
// Application Services
// ============================================================================
//
// One service per aggregate, each talking to the other only through the
// rpc gateways, plus the advisory consumers of the other side's events.
//
// ============================================================================

mod account_service;
mod consumers;
mod customer_service;

pub use account_service::{AccountService, LimitCheck};
pub use consumers::{AccountActivity, AccountActivityProjection, CustomerActivity, CustomerEventLogger};
pub use customer_service::{CustomerChanges, CustomerService, RegisterCustomer};
