// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with value objects, commands,
// events, errors, the aggregate itself and its repository trait.
// `shared` holds what both services agree on.
//
// This layer knows nothing about storage, transport or actors.
//
// ============================================================================

pub mod account;
pub mod customer;
pub mod shared;
