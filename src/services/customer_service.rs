use std::sync::Arc;

use crate::domain::customer::{
    Address, Customer, CustomerError, CustomerEvent, CustomerName, CustomerRepository, CustomerType, NationalId,
    NewCustomer,
};
use crate::domain::shared::{
    check_eligibility, AccountType, CustomerNumber, CustomerStatus,
};
use crate::eventing::Aggregate;
use crate::metrics::Metrics;
use crate::rpc::{
    AccountGateway, AccountInfo, ActiveAccounts, CallContext, CheckAccountLimitResponse, CustomerProjection,
    ValidateCustomerResponse,
};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// Customer Service
// ============================================================================
//
// Owns the customer aggregate and answers the Account service's identity
// and limit questions. Limit answers need the Account service's summary;
// if that call fails the limit check fails, it never defaults to zero.
//
// ============================================================================

/// Validated input for registering a customer.
#[derive(Debug, Clone)]
pub struct RegisterCustomer {
    pub name: CustomerName,
    pub national_id: NationalId,
    pub customer_type: CustomerType,
    pub address: Address,
}

/// Validated input for a details update; absent fields stay unchanged.
#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub name: Option<CustomerName>,
    pub address: Option<Address>,
    pub customer_type: Option<CustomerType>,
}

impl CustomerChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.customer_type.is_none()
    }
}

pub struct CustomerService {
    repository: Arc<dyn CustomerRepository>,
    accounts: Arc<dyn AccountGateway>,
    retry: RetryConfig,
    metrics: Arc<Metrics>,
}

impl CustomerService {
    pub fn new(
        repository: Arc<dyn CustomerRepository>,
        accounts: Arc<dyn AccountGateway>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repository,
            accounts,
            retry: RetryConfig::optimistic_lock(),
            metrics,
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub async fn create_customer(&self, ctx: &CallContext, request: RegisterCustomer) -> Result<Customer, CustomerError> {
        let result = self.register(ctx, request).await;
        match &result {
            Ok(customer) => {
                self.metrics.record_customer_created(customer.customer_type().as_str());
                tracing::info!(
                    customer_number = %customer.customer_number(),
                    customer_type = %customer.customer_type(),
                    correlation_id = %ctx.correlation_id(),
                    "✅ Customer created"
                );
            }
            Err(err) => self.observe_failure("create_customer", err),
        }
        result
    }

    async fn register(&self, ctx: &CallContext, request: RegisterCustomer) -> Result<Customer, CustomerError> {
        if self.repository.find_by_national_id(&request.national_id).await?.is_some() {
            return Err(CustomerError::CustomerAlreadyExists(request.national_id.as_str().to_string()));
        }

        let customer_number = self.repository.next_customer_number().await?;
        let customer = NewCustomer::register(
            customer_number,
            request.name,
            request.national_id,
            request.customer_type,
            request.address,
        );
        let events = vec![customer.created_event()];
        self.repository.insert(customer, events, &ctx.event_metadata()).await
    }

    pub async fn update_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        changes: CustomerChanges,
    ) -> Result<Customer, CustomerError> {
        if changes.is_empty() {
            let err = CustomerError::NoUpdateFieldsProvided;
            self.observe_failure("update_customer", &err);
            return Err(err);
        }
        self.mutate(ctx, customer_number, "update_customer", |customer| {
            customer.update_details(changes.name.clone(), changes.address.clone(), changes.customer_type)
        })
        .await
    }

    pub async fn update_status(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        target: CustomerStatus,
        reason: Option<String>,
    ) -> Result<Customer, CustomerError> {
        self.mutate(ctx, customer_number, "update_status", |customer| {
            customer.transition_to(target, reason.clone())
        })
        .await
    }

    pub async fn activate(&self, ctx: &CallContext, customer_number: &CustomerNumber) -> Result<Customer, CustomerError> {
        self.update_status(ctx, customer_number, CustomerStatus::Active, None).await
    }

    async fn mutate<F>(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        operation: &'static str,
        apply: F,
    ) -> Result<Customer, CustomerError>
    where
        F: Fn(&mut Customer) -> Result<Vec<CustomerEvent>, CustomerError> + Send + Sync,
    {
        let meta = ctx.event_metadata();
        let (repository, apply, meta) = (&self.repository, &apply, &meta);

        let result = retry_on_transient(self.retry.clone(), |_attempt| async move {
            let mut customer = repository
                .find_by_number(customer_number)
                .await?
                .ok_or_else(|| CustomerError::CustomerNotFound(customer_number.clone()))?;
            let events = apply(&mut customer)?;
            repository.update(&customer, events, meta).await
        })
        .await
        .into_result();

        match &result {
            Ok(customer) => tracing::info!(
                customer_number = %customer_number,
                operation = operation,
                status = %customer.status(),
                version = customer.version(),
                "Customer updated"
            ),
            Err(err) => self.observe_failure(operation, err),
        }
        result
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_customer(&self, customer_number: &CustomerNumber) -> Result<Customer, CustomerError> {
        self.repository
            .find_by_number(customer_number)
            .await?
            .ok_or_else(|| CustomerError::CustomerNotFound(customer_number.clone()))
    }

    pub async fn find_by_national_id(&self, national_id: &NationalId) -> Result<Option<Customer>, CustomerError> {
        self.repository.find_by_national_id(national_id).await
    }

    pub async fn search_customers(&self, name: &str) -> Result<Vec<Customer>, CustomerError> {
        if name.trim().is_empty() {
            return Err(CustomerError::MissingRequiredField("name"));
        }
        self.repository.search_by_name(name).await
    }

    /// The customer's accounts as reported by the Account service.
    pub async fn customer_accounts(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<Vec<AccountInfo>, CustomerError> {
        self.get_customer(customer_number).await?;
        self.accounts
            .get_accounts_by_customer(ctx, customer_number)
            .await
            .map_err(|e| CustomerError::AccountSummaryUnavailable {
                customer_number: customer_number.clone(),
                reason: e.to_string(),
            })
    }

    pub async fn active_accounts(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<ActiveAccounts, CustomerError> {
        self.get_customer(customer_number).await?;
        self.accounts
            .has_active_accounts(ctx, customer_number)
            .await
            .map_err(|e| CustomerError::AccountSummaryUnavailable {
                customer_number: customer_number.clone(),
                reason: e.to_string(),
            })
    }

    // ========================================================================
    // Answers for the Account service
    // ========================================================================

    pub async fn validate_customer(&self, customer_number: &CustomerNumber) -> Result<ValidateCustomerResponse, CustomerError> {
        let answer = match self.repository.find_by_number(customer_number).await? {
            Some(customer) => ValidateCustomerResponse::found(customer.status()),
            None => ValidateCustomerResponse::not_found(customer_number),
        };
        tracing::debug!(
            customer_number = %customer_number,
            is_valid = answer.is_valid,
            is_active = answer.is_active,
            "Answered customer validation"
        );
        Ok(answer)
    }

    pub async fn check_account_limit(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        account_type: AccountType,
    ) -> Result<CheckAccountLimitResponse, CustomerError> {
        let customer = match self.repository.find_by_number(customer_number).await? {
            Some(customer) => customer,
            None => return Ok(CheckAccountLimitResponse::customer_not_found(customer_number)),
        };

        if !customer.is_active() {
            return Ok(CheckAccountLimitResponse::not_active(customer.status()));
        }

        let summary = self
            .accounts
            .get_account_summary(ctx, customer_number)
            .await
            .map_err(|e| {
                let err = CustomerError::AccountSummaryUnavailable {
                    customer_number: customer_number.clone(),
                    reason: e.to_string(),
                };
                self.observe_failure("check_account_limit", &err);
                err
            })?;

        let holdings = summary.holdings();
        let answer = match check_eligibility(customer.status(), &holdings, account_type) {
            Ok(()) => CheckAccountLimitResponse::allowed(&holdings),
            Err(reason) => CheckAccountLimitResponse::denied(&holdings, &reason),
        }
        .with_salary_account(summary.salary_account().cloned());

        tracing::debug!(
            customer_number = %customer_number,
            account_type = %account_type,
            active_accounts = holdings.active_accounts,
            total_accounts = holdings.total_accounts,
            can_create = answer.can_create_account,
            "Answered account limit check"
        );
        Ok(answer)
    }

    pub async fn customer_projection(
        &self,
        customer_number: &CustomerNumber,
    ) -> Result<Option<CustomerProjection>, CustomerError> {
        Ok(self
            .repository
            .find_by_number(customer_number)
            .await?
            .as_ref()
            .map(CustomerProjection::from))
    }

    fn observe_failure(&self, operation: &'static str, err: &CustomerError) {
        self.metrics.record_rejection("customer", err.code());
        match err {
            CustomerError::AccountSummaryUnavailable { .. } | CustomerError::Storage(_) => {
                tracing::error!(operation = operation, error = %err, "Customer operation failed")
            }
            _ => tracing::warn!(operation = operation, error_code = err.code(), error = %err, "Customer operation rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountNumber, Balance};
    use crate::domain::shared::{AccountHoldings, AccountStatus};
    use crate::persistence::InMemoryCustomerStore;
    use crate::rpc::{AccountSummary, LimitDenial, RpcError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Answers with fixed holdings, or fails every call when `holdings` is None.
    struct StubAccounts {
        holdings: Option<AccountHoldings>,
        calls: AtomicU32,
    }

    impl StubAccounts {
        fn with(holdings: AccountHoldings) -> Arc<Self> {
            Arc::new(Self { holdings: Some(holdings), calls: AtomicU32::new(0) })
        }

        fn down() -> Arc<Self> {
            Arc::new(Self { holdings: None, calls: AtomicU32::new(0) })
        }
    }

    #[async_trait]
    impl AccountGateway for StubAccounts {
        async fn get_account_summary(
            &self,
            _ctx: &CallContext,
            customer_number: &CustomerNumber,
        ) -> Result<AccountSummary, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let holdings = self.holdings.ok_or(RpcError::Timeout { operation: "get_account_summary" })?;
            Ok(AccountSummary {
                customer_number: customer_number.clone(),
                total_accounts: holdings.total_accounts,
                active_accounts: holdings.active_accounts,
                has_salary_account: holdings.has_salary_account,
                total_balance: Balance::zero(),
                account_details: salary_details(customer_number, &holdings),
            })
        }

        async fn get_accounts_by_customer(
            &self,
            _ctx: &CallContext,
            _customer_number: &CustomerNumber,
        ) -> Result<Vec<AccountInfo>, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.holdings {
                Some(_) => Ok(Vec::new()),
                None => Err(RpcError::Transport("connection refused".into())),
            }
        }

        async fn has_active_accounts(
            &self,
            _ctx: &CallContext,
            _customer_number: &CustomerNumber,
        ) -> Result<ActiveAccounts, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RpcError::Transport("connection refused".into()))
        }
    }

    fn salary_details(customer_number: &CustomerNumber, holdings: &AccountHoldings) -> Vec<AccountInfo> {
        if !holdings.has_salary_account {
            return Vec::new();
        }
        let now = chrono::Utc::now();
        vec![AccountInfo {
            account_number: AccountNumber::parse(format!("{}001", customer_number)).unwrap(),
            customer_number: customer_number.clone(),
            account_type: AccountType::Salary,
            status: AccountStatus::Active,
            balance: Balance::zero(),
            created_at: now,
            updated_at: now,
        }]
    }

    fn service(accounts: Arc<StubAccounts>) -> CustomerService {
        CustomerService::new(
            Arc::new(InMemoryCustomerStore::with_sequence_start(1234567)),
            accounts,
            Arc::new(Metrics::new().unwrap()),
        )
    }

    fn ctx() -> CallContext {
        CallContext::with_timeout(Duration::from_secs(2))
    }

    fn request(national_id: &str) -> RegisterCustomer {
        RegisterCustomer {
            name: CustomerName::parse("Ada Lovelace").unwrap(),
            national_id: NationalId::parse(national_id).unwrap(),
            customer_type: CustomerType::Retail,
            address: Address::parse("12 St James's Square, London").unwrap(),
        }
    }

    async fn active_customer(service: &CustomerService) -> CustomerNumber {
        let customer = service.create_customer(&ctx(), request("289012345678")).await.unwrap();
        service.activate(&ctx(), customer.customer_number()).await.unwrap();
        customer.customer_number().clone()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_numbers_in_pending() {
        let service = service(StubAccounts::with(AccountHoldings::default()));

        let first = service.create_customer(&ctx(), request("289012345678")).await.unwrap();
        let second = service.create_customer(&ctx(), request("389012345678")).await.unwrap();

        assert_eq!(first.customer_number().as_str(), "1234567");
        assert_eq!(second.customer_number().as_str(), "1234568");
        assert_eq!(first.status(), CustomerStatus::Pending);
        assert_eq!(first.version(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_national_id_conflicts() {
        let service = service(StubAccounts::with(AccountHoldings::default()));
        service.create_customer(&ctx(), request("289012345678")).await.unwrap();

        let err = service.create_customer(&ctx(), request("289012345678")).await.unwrap_err();

        assert_eq!(err, CustomerError::CustomerAlreadyExists("289012345678".into()));
        assert_eq!(err.kind().status_code(), 409);
    }

    #[tokio::test]
    async fn test_update_requires_at_least_one_field() {
        let service = service(StubAccounts::with(AccountHoldings::default()));
        let number = active_customer(&service).await;

        let err = service.update_customer(&ctx(), &number, CustomerChanges::default()).await.unwrap_err();
        assert_eq!(err, CustomerError::NoUpdateFieldsProvided);

        let changes = CustomerChanges {
            address: Some(Address::parse("1 Infinite Loop").unwrap()),
            ..Default::default()
        };
        let updated = service.update_customer(&ctx(), &number, changes).await.unwrap();
        assert_eq!(updated.address().as_str(), "1 Infinite Loop");
        assert_eq!(updated.version(), 3);
    }

    #[tokio::test]
    async fn test_status_update_follows_lifecycle() {
        let service = service(StubAccounts::with(AccountHoldings::default()));
        let number = active_customer(&service).await;

        let frozen = service.update_status(&ctx(), &number, CustomerStatus::Frozen, None).await.unwrap();
        assert_eq!(frozen.status(), CustomerStatus::Frozen);

        let err = service.update_status(&ctx(), &number, CustomerStatus::Pending, None).await.unwrap_err();
        assert!(matches!(err, CustomerError::InvalidStatusTransition { .. }));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_rejects_blank() {
        let service = service(StubAccounts::with(AccountHoldings::default()));
        service.create_customer(&ctx(), request("289012345678")).await.unwrap();

        assert_eq!(service.search_customers("LOVE").await.unwrap().len(), 1);
        assert!(service.search_customers("turing").await.unwrap().is_empty());
        assert_eq!(
            service.search_customers("  ").await.unwrap_err(),
            CustomerError::MissingRequiredField("name")
        );
    }

    #[tokio::test]
    async fn test_validation_of_unknown_customer() {
        let service = service(StubAccounts::with(AccountHoldings::default()));
        let answer = service
            .validate_customer(&CustomerNumber::parse("7654321").unwrap())
            .await
            .unwrap();
        assert!(!answer.is_valid);
        assert!(!answer.is_active);
    }

    #[tokio::test]
    async fn test_limit_check_for_pending_customer_skips_account_call() {
        let accounts = StubAccounts::with(AccountHoldings::default());
        let service = service(accounts.clone());
        let customer = service.create_customer(&ctx(), request("289012345678")).await.unwrap();

        let answer = service
            .check_account_limit(&ctx(), customer.customer_number(), AccountType::Saving)
            .await
            .unwrap();

        assert!(!answer.can_create_account);
        assert_eq!(answer.denial, Some(LimitDenial::CustomerNotActive(CustomerStatus::Pending)));
        assert_eq!(answer.current_account_count, None);
        assert_eq!(answer.already_has_salary_account, None);
        assert_eq!(accounts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_limit_check_reflects_holdings() {
        let full = AccountHoldings { total_accounts: 10, active_accounts: 10, has_salary_account: false };
        let service_full = service(StubAccounts::with(full));
        let number = active_customer(&service_full).await;
        let answer = service_full.check_account_limit(&ctx(), &number, AccountType::Saving).await.unwrap();
        assert!(!answer.can_create_account);
        assert_eq!(answer.denial, Some(LimitDenial::ActiveLimitReached));
        assert_eq!(answer.current_account_count, Some(10));

        let salaried = AccountHoldings { total_accounts: 1, active_accounts: 1, has_salary_account: true };
        let service_salary = service(StubAccounts::with(salaried));
        let number = active_customer(&service_salary).await;
        let salary = service_salary.check_account_limit(&ctx(), &number, AccountType::Salary).await.unwrap();
        assert_eq!(salary.denial, Some(LimitDenial::SalaryAccountExists));
        assert_eq!(salary.existing_salary_account.as_ref().map(|n| n.as_str()), Some(format!("{}001", number).as_str()));
        let saving = service_salary.check_account_limit(&ctx(), &number, AccountType::Saving).await.unwrap();
        assert!(saving.can_create_account);
    }

    #[tokio::test]
    async fn test_limit_check_fails_closed_when_accounts_unreachable() {
        let service = service(StubAccounts::down());
        let number = active_customer(&service).await;

        let err = service.check_account_limit(&ctx(), &number, AccountType::Saving).await.unwrap_err();

        assert!(matches!(err, CustomerError::AccountSummaryUnavailable { .. }));
        assert_eq!(err.kind().status_code(), 503);
    }

    #[tokio::test]
    async fn test_account_listing_requires_known_customer() {
        let service = service(StubAccounts::down());
        let unknown = CustomerNumber::parse("7654321").unwrap();

        let err = service.customer_accounts(&ctx(), &unknown).await.unwrap_err();
        assert_eq!(err, CustomerError::CustomerNotFound(unknown));

        let number = active_customer(&service).await;
        let err = service.active_accounts(&ctx(), &number).await.unwrap_err();
        assert!(matches!(err, CustomerError::AccountSummaryUnavailable { .. }));
    }
}
