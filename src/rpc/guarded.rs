use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout_at;

use crate::domain::shared::{AccountType, CustomerNumber};
use crate::metrics::Metrics;
use crate::utils::{retry_on_transient, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, RetryConfig};

use super::context::CallContext;
use super::contracts::{
    AccountGateway, AccountInfo, AccountSummary, ActiveAccounts, CheckAccountLimitResponse, CustomerGateway,
    CustomerProjection, RpcError, ValidateCustomerResponse,
};

// ============================================================================
// Guarded Gateways
// ============================================================================
//
// Wrap a raw gateway with, per attempt:
//   deadline (from the CallContext) -> circuit breaker -> transient retry
//
// A timeout counts as a breaker failure and is not retried: the deadline
// belongs to the originating request and is already spent.
//
// ============================================================================

#[derive(Clone)]
pub struct RpcGuard {
    breaker: CircuitBreaker,
    retry: RetryConfig,
    metrics: Arc<Metrics>,
}

impl RpcGuard {
    pub fn new(name: &str, breaker: CircuitBreakerConfig, retry: RetryConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            breaker: CircuitBreaker::new(name, breaker).with_metrics(metrics.clone()),
            retry,
            metrics,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, ctx: &CallContext, call: F) -> Result<T, RpcError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, RpcError>> + Send,
    {
        let started = Instant::now();
        let deadline = ctx.deadline();
        let breaker = &self.breaker;
        let metrics = &self.metrics;
        let call = &call;

        let result = retry_on_transient(self.retry.clone(), |attempt| async move {
            if attempt > 1 {
                metrics.record_retry_attempt(operation, attempt);
            }
            let guarded = breaker
                .call(async move {
                    match timeout_at(deadline, call()).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(RpcError::Timeout { operation }),
                    }
                })
                .await;
            match guarded {
                Ok(value) => Ok(value),
                Err(CircuitBreakerError::CircuitOpen) => Err(RpcError::Unavailable(breaker.name().to_string())),
                Err(CircuitBreakerError::OperationFailed(err)) => Err(err),
            }
        })
        .await
        .into_result();

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(_) => metrics.record_rpc(operation, "ok", elapsed),
            Err(err) => {
                tracing::error!(
                    operation = operation,
                    correlation_id = %ctx.correlation_id(),
                    error = %err,
                    "Inter-service call failed"
                );
                let outcome = match err {
                    RpcError::Timeout { .. } => "timeout",
                    RpcError::Unavailable(_) => "circuit_open",
                    RpcError::Transport(_) => "transport",
                    RpcError::Remote(_) => "remote",
                };
                metrics.record_rpc(operation, outcome, elapsed);
            }
        }
        result
    }
}

/// Account service's view of the Customer service.
pub struct GuardedCustomerGateway {
    inner: Arc<dyn CustomerGateway>,
    guard: RpcGuard,
}

impl GuardedCustomerGateway {
    pub fn new(inner: Arc<dyn CustomerGateway>, guard: RpcGuard) -> Self {
        Self { inner, guard }
    }

    pub fn guard(&self) -> &RpcGuard {
        &self.guard
    }
}

#[async_trait]
impl CustomerGateway for GuardedCustomerGateway {
    async fn validate_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<ValidateCustomerResponse, RpcError> {
        self.guard
            .run("validate_customer", ctx, || self.inner.validate_customer(ctx, customer_number))
            .await
    }

    async fn check_account_limit(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        account_type: AccountType,
    ) -> Result<CheckAccountLimitResponse, RpcError> {
        self.guard
            .run("check_account_limit", ctx, || {
                self.inner.check_account_limit(ctx, customer_number, account_type)
            })
            .await
    }

    async fn get_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<Option<CustomerProjection>, RpcError> {
        self.guard
            .run("get_customer", ctx, || self.inner.get_customer(ctx, customer_number))
            .await
    }
}

/// Customer service's view of the Account service.
pub struct GuardedAccountGateway {
    inner: Arc<dyn AccountGateway>,
    guard: RpcGuard,
}

impl GuardedAccountGateway {
    pub fn new(inner: Arc<dyn AccountGateway>, guard: RpcGuard) -> Self {
        Self { inner, guard }
    }

    pub fn guard(&self) -> &RpcGuard {
        &self.guard
    }
}

#[async_trait]
impl AccountGateway for GuardedAccountGateway {
    async fn get_account_summary(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<AccountSummary, RpcError> {
        self.guard
            .run("get_account_summary", ctx, || self.inner.get_account_summary(ctx, customer_number))
            .await
    }

    async fn get_accounts_by_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<Vec<AccountInfo>, RpcError> {
        self.guard
            .run("get_accounts_by_customer", ctx, || {
                self.inner.get_accounts_by_customer(ctx, customer_number)
            })
            .await
    }

    async fn has_active_accounts(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<ActiveAccounts, RpcError> {
        self.guard
            .run("has_active_accounts", ctx, || self.inner.has_active_accounts(ctx, customer_number))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::CustomerStatus;
    use crate::utils::CircuitState;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails with `Transport` for the first `failures` calls, optionally slow.
    struct FlakyCustomers {
        calls: AtomicU32,
        failures: u32,
        delay: Duration,
    }

    impl FlakyCustomers {
        fn new(failures: u32, delay: Duration) -> Self {
            Self { calls: AtomicU32::new(0), failures, delay }
        }
    }

    #[async_trait]
    impl CustomerGateway for FlakyCustomers {
        async fn validate_customer(
            &self,
            _ctx: &CallContext,
            _customer_number: &CustomerNumber,
        ) -> Result<ValidateCustomerResponse, RpcError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if call < self.failures {
                return Err(RpcError::Transport("connection reset".into()));
            }
            Ok(ValidateCustomerResponse::found(CustomerStatus::Active))
        }

        async fn check_account_limit(
            &self,
            _ctx: &CallContext,
            customer_number: &CustomerNumber,
            _account_type: AccountType,
        ) -> Result<CheckAccountLimitResponse, RpcError> {
            Ok(CheckAccountLimitResponse::customer_not_found(customer_number))
        }

        async fn get_customer(
            &self,
            _ctx: &CallContext,
            _customer_number: &CustomerNumber,
        ) -> Result<Option<CustomerProjection>, RpcError> {
            Err(RpcError::Remote("store offline".into()))
        }
    }

    fn gateway(inner: FlakyCustomers, failure_threshold: u32) -> (Arc<FlakyCustomers>, GuardedCustomerGateway) {
        let inner = Arc::new(inner);
        let guard = RpcGuard::new(
            "customer-rpc",
            CircuitBreakerConfig {
                failure_threshold,
                timeout: Duration::from_secs(60),
                success_threshold: 1,
            },
            RetryConfig {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                multiplier: 2.0,
            },
            Arc::new(Metrics::new().unwrap()),
        );
        (inner.clone(), GuardedCustomerGateway::new(inner, guard))
    }

    fn number() -> CustomerNumber {
        CustomerNumber::parse("1234567").unwrap()
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried() {
        let (inner, gateway) = gateway(FlakyCustomers::new(2, Duration::ZERO), 10);
        let ctx = CallContext::with_timeout(Duration::from_secs(1));

        let response = gateway.validate_customer(&ctx, &number()).await.unwrap();
        assert!(response.is_active);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_deadline_is_enforced() {
        let (_, gateway) = gateway(FlakyCustomers::new(0, Duration::from_millis(200)), 10);
        let ctx = CallContext::with_timeout(Duration::from_millis(20));

        let result = gateway.validate_customer(&ctx, &number()).await;
        assert_eq!(result, Err(RpcError::Timeout { operation: "validate_customer" }));
    }

    #[tokio::test]
    async fn test_remote_errors_are_not_retried() {
        let (_, gateway) = gateway(FlakyCustomers::new(0, Duration::ZERO), 10);
        let ctx = CallContext::with_timeout(Duration::from_secs(1));

        let result = gateway.get_customer(&ctx, &number()).await;
        assert!(matches!(result, Err(RpcError::Remote(_))));
    }

    #[tokio::test]
    async fn test_open_circuit_short_circuits() {
        let (inner, gateway) = gateway(FlakyCustomers::new(u32::MAX, Duration::ZERO), 2);
        let ctx = CallContext::with_timeout(Duration::from_secs(1));

        let _ = gateway.validate_customer(&ctx, &number()).await;
        assert_eq!(gateway.guard().breaker().get_state().await, CircuitState::Open);
        let calls_before = inner.calls.load(Ordering::SeqCst);

        let result = gateway.validate_customer(&ctx, &number()).await;
        assert_eq!(result, Err(RpcError::Unavailable("customer-rpc".into())));
        assert_eq!(inner.calls.load(Ordering::SeqCst), calls_before);
    }
}
