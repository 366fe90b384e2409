// ============================================================================
// Persistence - in-memory stores with a transactional outbox
// ============================================================================

mod account_store;
mod customer_store;
mod outbox_table;

pub use account_store::InMemoryAccountStore;
pub use customer_store::InMemoryCustomerStore;
