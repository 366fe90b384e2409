// ============================================================================
// Customer Domain - Business Logic for the Customer Aggregate
// ============================================================================
//
// - Value objects (CustomerName, Address, NationalId, CustomerType)
// - Commands and events
// - Errors (CustomerError)
// - Aggregate (NewCustomer / Customer)
// - Repository trait
//
// ============================================================================

pub mod aggregate;
pub mod commands;
pub mod errors;
pub mod events;
pub mod repository;
pub mod value_objects;

pub use aggregate::{Customer, NewCustomer};
pub use commands::CustomerCommand;
pub use errors::CustomerError;
pub use events::*;
pub use repository::CustomerRepository;
pub use value_objects::*;
