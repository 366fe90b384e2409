// ============================================================================
// Account Domain - Business Logic for the Account Aggregate
// ============================================================================
//
// - Value objects (AccountNumber, Serial, Balance)
// - Commands and events
// - Errors (AccountError)
// - Aggregate (NewAccount / Account)
// - Serial allocator
// - Repository trait
//
// ============================================================================

pub mod aggregate;
pub mod allocator;
pub mod commands;
pub mod errors;
pub mod events;
pub mod repository;
pub mod value_objects;

pub use aggregate::{Account, NewAccount};
pub use allocator::{holdings_of, next_account_number};
pub use commands::AccountCommand;
pub use errors::AccountError;
pub use events::*;
pub use repository::AccountRepository;
pub use value_objects::*;
