use std::sync::Arc;

use crate::actors::HealthProbe;
use crate::config::AppConfig;
use crate::domain::account::AccountRepository;
use crate::domain::customer::CustomerRepository;
use crate::eventing::OutboxSource;
use crate::metrics::Metrics;
use crate::persistence::{InMemoryAccountStore, InMemoryCustomerStore};
use crate::rpc::{
    AccountGateway, AccountRpcHandler, CallContext, CustomerGateway, CustomerRpcHandler, GuardedAccountGateway,
    GuardedCustomerGateway, RpcGuard,
};
use crate::services::{AccountActivityProjection, AccountService, CustomerEventLogger, CustomerService};
use crate::web::ApiSettings;

// ============================================================================
// BankSystem - wires both services together
// ============================================================================
//
// Account service  --GuardedCustomerGateway-->  CustomerRpcHandler  --> CustomerService
// Customer service --GuardedAccountGateway-->   AccountRpcHandler   --> account store
//
// Every cross-service call goes through an RpcGuard (deadline, retry,
// circuit breaker). Each service owns its store and that store's outbox.
//
// ============================================================================

pub struct BankSystem {
    pub account_store: Arc<InMemoryAccountStore>,
    pub customer_store: Arc<InMemoryCustomerStore>,
    pub accounts: Arc<AccountService>,
    pub customers: Arc<CustomerService>,
    pub projection: Arc<AccountActivityProjection>,
    pub customer_logger: Arc<CustomerEventLogger>,
    pub customer_gateway: Arc<GuardedCustomerGateway>,
    pub account_gateway: Arc<GuardedAccountGateway>,
    pub metrics: Arc<Metrics>,
    pub settings: ApiSettings,
}

impl BankSystem {
    pub fn new(config: &AppConfig, metrics: Arc<Metrics>) -> Self {
        let account_store = Arc::new(InMemoryAccountStore::new());
        let customer_store = Arc::new(InMemoryCustomerStore::with_sequence_start(config.customer_number_seed));

        let account_repository: Arc<dyn AccountRepository> = account_store.clone();
        let account_handler: Arc<dyn AccountGateway> = Arc::new(AccountRpcHandler::new(account_repository.clone()));
        let account_gateway = Arc::new(GuardedAccountGateway::new(
            account_handler,
            RpcGuard::new(
                "account-service",
                config.circuit_breaker.clone(),
                config.rpc_retry.clone(),
                metrics.clone(),
            ),
        ));

        let customer_repository: Arc<dyn CustomerRepository> = customer_store.clone();
        let customers = Arc::new(CustomerService::new(
            customer_repository,
            account_gateway.clone(),
            metrics.clone(),
        ));

        let customer_handler: Arc<dyn CustomerGateway> = Arc::new(CustomerRpcHandler::new(customers.clone()));
        let customer_gateway = Arc::new(GuardedCustomerGateway::new(
            customer_handler,
            RpcGuard::new(
                "customer-service",
                config.circuit_breaker.clone(),
                config.rpc_retry.clone(),
                metrics.clone(),
            ),
        ));

        let accounts = Arc::new(AccountService::new(
            account_repository,
            customer_gateway.clone(),
            config.limit_check,
            metrics.clone(),
        ));

        tracing::info!(
            customer_number_seed = config.customer_number_seed,
            limit_check = ?config.limit_check,
            "🏦 Bank system wired"
        );

        Self {
            account_store,
            customer_store,
            accounts,
            customers,
            projection: Arc::new(AccountActivityProjection::new()),
            customer_logger: Arc::new(CustomerEventLogger::new()),
            customer_gateway,
            account_gateway,
            metrics,
            settings: ApiSettings::new(config.rpc_timeout),
        }
    }

    /// Breakers the health monitor should watch.
    pub fn health_probes(&self) -> Vec<HealthProbe> {
        vec![
            HealthProbe::Breaker(self.customer_gateway.guard().breaker().clone()),
            HealthProbe::Breaker(self.account_gateway.guard().breaker().clone()),
        ]
    }

    pub fn outbox_sources(&self) -> Vec<Arc<dyn OutboxSource>> {
        vec![self.account_store.clone(), self.customer_store.clone()]
    }

    /// Context for work that does not come from an HTTP request.
    pub fn call_context(&self) -> CallContext {
        CallContext::with_timeout(self.settings.request_timeout)
    }
}
