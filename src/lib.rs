// ============================================================================
// bank_ms - Account and Customer services with transactional outbox
// ============================================================================

pub mod actors;
pub mod config;
pub mod domain;
pub mod eventing;
pub mod messaging;
pub mod metrics;
pub mod persistence;
pub mod rpc;
pub mod services;
pub mod system;
pub mod utils;
pub mod web;

pub use config::AppConfig;
pub use system::BankSystem;
