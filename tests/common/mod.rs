#![allow(dead_code)]

use std::sync::Arc;

use bank_ms::domain::customer::{Address, CustomerName, CustomerType, NationalId};
use bank_ms::domain::shared::CustomerNumber;
use bank_ms::metrics::Metrics;
use bank_ms::rpc::CallContext;
use bank_ms::services::RegisterCustomer;
use bank_ms::{AppConfig, BankSystem};

pub const SEED: u32 = 1_234_567;

pub fn system() -> BankSystem {
    let config = AppConfig { customer_number_seed: SEED, ..AppConfig::default() };
    BankSystem::new(&config, Arc::new(Metrics::new().unwrap()))
}

pub fn registration(national_id: &str) -> RegisterCustomer {
    RegisterCustomer {
        name: CustomerName::parse("Grace Hopper").unwrap(),
        national_id: NationalId::parse(national_id).unwrap(),
        customer_type: CustomerType::Retail,
        address: Address::parse("1 Navy Yard Road, Arlington").unwrap(),
    }
}

/// Registers and activates a customer.
pub async fn active_customer(system: &BankSystem, national_id: &str) -> CustomerNumber {
    let ctx = system.call_context();
    let customer = system.customers.create_customer(&ctx, registration(national_id)).await.unwrap();
    system.customers.activate(&ctx, customer.customer_number()).await.unwrap();
    customer.customer_number().clone()
}

pub fn ctx(system: &BankSystem) -> CallContext {
    system.call_context()
}
