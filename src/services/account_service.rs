use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::account::{
    holdings_of, next_account_number, Account, AccountCommand, AccountError, AccountEvent, AccountNumber,
    AccountRepository, Balance, NewAccount,
};
use crate::domain::shared::{
    check_eligibility, AccountStatus, AccountType, CustomerNumber, CustomerStatus, Ineligibility,
};
use crate::eventing::Aggregate;
use crate::metrics::Metrics;
use crate::rpc::{CallContext, CheckAccountLimitResponse, CustomerGateway, LimitDenial, RpcError, ValidateCustomerResponse};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// Account Service
// ============================================================================
//
// Creation path:
//   1. ValidateCustomer (Customer service)  -> exists and ACTIVE
//   2. CheckAccountLimit (Customer service) -> when limit_check = Remote
//   3. per-customer lock: recheck own counts, allocate serial, insert
//
// Any failure to get an answer from the Customer service fails the request.
// Mutations are compare-and-swap on the row version with bounded retry.
//
// ============================================================================

/// Where the account-count rules are evaluated before allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitCheck {
    /// Ask the Customer service (which asks back for the summary), then recheck locally.
    Remote,
    /// Only the local recheck against this service's own store.
    Local,
}

impl std::str::FromStr for LimitCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(LimitCheck::Remote),
            "local" => Ok(LimitCheck::Local),
            other => Err(format!("unknown limit check mode '{}'", other)),
        }
    }
}

pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    customers: Arc<dyn CustomerGateway>,
    limit_check: LimitCheck,
    creation_locks: DashMap<CustomerNumber, Arc<Mutex<()>>>,
    retry: RetryConfig,
    metrics: Arc<Metrics>,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        customers: Arc<dyn CustomerGateway>,
        limit_check: LimitCheck,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repository,
            customers,
            limit_check,
            creation_locks: DashMap::new(),
            retry: RetryConfig::optimistic_lock(),
            metrics,
        }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    pub async fn create_account(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        account_type: AccountType,
    ) -> Result<Account, AccountError> {
        let result = self.open_account(ctx, customer_number, account_type).await;
        match &result {
            Ok(account) => {
                self.metrics.record_account_created(account_type.as_str());
                tracing::info!(
                    account_number = %account.account_number(),
                    customer_number = %customer_number,
                    account_type = %account_type,
                    correlation_id = %ctx.correlation_id(),
                    "✅ Account created"
                );
            }
            Err(err) => self.observe_failure("create_account", err),
        }
        result
    }

    async fn open_account(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        account_type: AccountType,
    ) -> Result<Account, AccountError> {
        let status = self.verify_customer(ctx, customer_number).await?;

        if self.limit_check == LimitCheck::Remote {
            let answer = self
                .customers
                .check_account_limit(ctx, customer_number, account_type)
                .await
                .map_err(|e| unavailable(customer_number, e))?;
            interpret_limit(customer_number, answer)?;
        }

        let lock = self.creation_lock(customer_number);
        let result = {
            let _guard = lock.lock().await;
            self.insert_next_account(ctx, customer_number, status, account_type).await
        };
        drop(lock);
        self.release_creation_lock(customer_number);
        result
    }

    /// Runs under the customer's creation lock.
    async fn insert_next_account(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        status: CustomerStatus,
        account_type: AccountType,
    ) -> Result<Account, AccountError> {
        let existing = self.repository.find_by_customer(customer_number).await?;
        check_eligibility(status, &holdings_of(&existing), account_type)
            .map_err(|reason| rejection(customer_number, reason, &existing))?;

        let serials: Vec<&str> = existing.iter().map(|a| a.account_number().serial_number()).collect();
        let account_number = next_account_number(customer_number, &serials)?;

        let account = NewAccount::open(account_number, account_type);
        let events = vec![account.created_event()];
        self.repository.insert(account, events, &ctx.event_metadata()).await
    }

    async fn verify_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<CustomerStatus, AccountError> {
        let answer = self
            .customers
            .validate_customer(ctx, customer_number)
            .await
            .map_err(|e| unavailable(customer_number, e))?;
        interpret_validation(customer_number, answer)
    }

    fn creation_lock(&self, customer_number: &CustomerNumber) -> Arc<Mutex<()>> {
        self.creation_locks
            .entry(customer_number.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the lock entry once no other request holds a handle to it.
    fn release_creation_lock(&self, customer_number: &CustomerNumber) {
        self.creation_locks
            .remove_if(customer_number, |_, lock| Arc::strong_count(lock) == 1);
    }

    // ========================================================================
    // Ledger and lifecycle
    // ========================================================================

    pub async fn credit(
        &self,
        ctx: &CallContext,
        account_number: &AccountNumber,
        amount: Balance,
        description: Option<String>,
    ) -> Result<Account, AccountError> {
        let account = self
            .mutate(ctx, account_number, "credit", |account| {
                account.execute(&AccountCommand::Credit { amount, description: description.clone() })
            })
            .await?;
        self.metrics.record_transaction("CREDIT");
        Ok(account)
    }

    pub async fn debit(
        &self,
        ctx: &CallContext,
        account_number: &AccountNumber,
        amount: Balance,
        description: Option<String>,
    ) -> Result<Account, AccountError> {
        let account = self
            .mutate(ctx, account_number, "debit", |account| {
                account.execute(&AccountCommand::Debit { amount, description: description.clone() })
            })
            .await?;
        self.metrics.record_transaction("DEBIT");
        Ok(account)
    }

    pub async fn activate(&self, ctx: &CallContext, account_number: &AccountNumber) -> Result<Account, AccountError> {
        self.mutate(ctx, account_number, "activate", Account::activate).await
    }

    pub async fn suspend(&self, ctx: &CallContext, account_number: &AccountNumber) -> Result<Account, AccountError> {
        self.mutate(ctx, account_number, "suspend", Account::suspend).await
    }

    pub async fn freeze(&self, ctx: &CallContext, account_number: &AccountNumber) -> Result<Account, AccountError> {
        self.mutate(ctx, account_number, "freeze", Account::freeze).await
    }

    /// Soft delete: requires a zero balance, the row stays.
    pub async fn close(
        &self,
        ctx: &CallContext,
        account_number: &AccountNumber,
        reason: Option<String>,
    ) -> Result<Account, AccountError> {
        self.mutate(ctx, account_number, "close", |account| {
            account.execute(&AccountCommand::Close { reason: reason.clone() })
        })
        .await
    }

    pub async fn update_status(
        &self,
        ctx: &CallContext,
        account_number: &AccountNumber,
        target: AccountStatus,
        reason: Option<String>,
    ) -> Result<Account, AccountError> {
        self.mutate(ctx, account_number, "update_status", |account| {
            account.transition_to(target, reason.clone())
        })
        .await
    }

    /// Load, apply, compare-and-swap; a lost race reloads and re-applies.
    async fn mutate<F>(
        &self,
        ctx: &CallContext,
        account_number: &AccountNumber,
        operation: &'static str,
        apply: F,
    ) -> Result<Account, AccountError>
    where
        F: Fn(&mut Account) -> Result<Vec<AccountEvent>, AccountError> + Send + Sync,
    {
        let meta = ctx.event_metadata();
        let (repository, apply, meta) = (&self.repository, &apply, &meta);

        let result = retry_on_transient(self.retry.clone(), |attempt| async move {
            if attempt > 1 {
                tracing::debug!(account_number = %account_number, attempt = attempt, "Retrying after version conflict");
            }
            let mut account = repository
                .find_by_number(account_number)
                .await?
                .ok_or_else(|| AccountError::AccountNotFound(account_number.clone()))?;
            let events = apply(&mut account)?;
            repository.update(&account, events, meta).await
        })
        .await
        .into_result();

        match &result {
            Ok(account) => tracing::info!(
                account_number = %account_number,
                operation = operation,
                status = %account.status(),
                balance = %account.balance(),
                version = account.version(),
                "Account updated"
            ),
            Err(err) => self.observe_failure(operation, err),
        }
        result
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_account(&self, account_number: &AccountNumber) -> Result<Account, AccountError> {
        self.repository
            .find_by_number(account_number)
            .await?
            .ok_or_else(|| AccountError::AccountNotFound(account_number.clone()))
    }

    pub async fn get_accounts_by_customer(&self, customer_number: &CustomerNumber) -> Result<Vec<Account>, AccountError> {
        self.repository.find_by_customer(customer_number).await
    }

    fn observe_failure(&self, operation: &'static str, err: &AccountError) {
        self.metrics.record_rejection("account", err.code());
        match err {
            AccountError::CustomerVerificationUnavailable { .. } | AccountError::Storage(_) => {
                tracing::error!(operation = operation, error = %err, "Account operation failed")
            }
            _ => tracing::warn!(operation = operation, error_code = err.code(), error = %err, "Account operation rejected"),
        }
    }
}

// ============================================================================
// Answer interpretation (fail closed)
// ============================================================================

fn unavailable(customer_number: &CustomerNumber, err: RpcError) -> AccountError {
    AccountError::CustomerVerificationUnavailable {
        customer_number: customer_number.clone(),
        reason: err.to_string(),
    }
}

fn interpret_validation(
    customer_number: &CustomerNumber,
    answer: ValidateCustomerResponse,
) -> Result<CustomerStatus, AccountError> {
    if !answer.is_valid {
        return Err(AccountError::CustomerNotFound(customer_number.clone()));
    }
    let status = answer.status.ok_or_else(|| AccountError::CustomerVerificationUnavailable {
        customer_number: customer_number.clone(),
        reason: "validation answer carried no status".into(),
    })?;
    if !answer.is_active || !status.is_active() {
        return Err(AccountError::CustomerNotActive {
            customer_number: customer_number.clone(),
            status,
        });
    }
    Ok(status)
}

fn interpret_limit(customer_number: &CustomerNumber, answer: CheckAccountLimitResponse) -> Result<(), AccountError> {
    if answer.can_create_account {
        return Ok(());
    }
    let customer_number = customer_number.clone();
    Err(match answer.denial {
        Some(LimitDenial::CustomerNotFound) => AccountError::CustomerNotFound(customer_number),
        Some(LimitDenial::CustomerNotActive(status)) => AccountError::CustomerNotActive { customer_number, status },
        Some(LimitDenial::ActiveLimitReached) | Some(LimitDenial::SerialsExhausted) => {
            AccountError::AccountLimitExceeded { customer_number, limit: answer.max_account_limit }
        }
        Some(LimitDenial::SalaryAccountExists) => AccountError::SalaryAccountAlreadyExists {
            customer_number,
            existing_account: answer.existing_salary_account,
        },
        None => AccountError::CustomerVerificationUnavailable {
            customer_number,
            reason: answer
                .error_message
                .unwrap_or_else(|| "limit check refused without a reason".into()),
        },
    })
}

fn rejection(customer_number: &CustomerNumber, reason: Ineligibility, existing: &[Account]) -> AccountError {
    let customer_number = customer_number.clone();
    match reason {
        Ineligibility::CustomerNotActive(status) => AccountError::CustomerNotActive { customer_number, status },
        Ineligibility::ActiveLimitReached { limit, .. } | Ineligibility::SerialsExhausted { limit, .. } => {
            AccountError::AccountLimitExceeded { customer_number, limit }
        }
        Ineligibility::SalaryAccountExists => AccountError::SalaryAccountAlreadyExists {
            customer_number,
            existing_account: existing
                .iter()
                .find(|a| a.account_type().is_salary() && !a.is_closed())
                .map(|a| a.account_number().clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::AccountHoldings;

    fn number() -> CustomerNumber {
        CustomerNumber::parse("1234567").unwrap()
    }

    #[test]
    fn test_invalid_answer_means_not_found() {
        let result = interpret_validation(&number(), ValidateCustomerResponse::not_found(&number()));
        assert_eq!(result, Err(AccountError::CustomerNotFound(number())));
    }

    #[test]
    fn test_inactive_answer_carries_status() {
        let result = interpret_validation(&number(), ValidateCustomerResponse::found(CustomerStatus::Suspended));
        assert_eq!(
            result,
            Err(AccountError::CustomerNotActive { customer_number: number(), status: CustomerStatus::Suspended })
        );
    }

    #[test]
    fn test_valid_answer_without_status_fails_closed() {
        let answer = ValidateCustomerResponse { is_valid: true, is_active: true, status: None, error_message: None };
        let result = interpret_validation(&number(), answer);
        assert!(matches!(result, Err(AccountError::CustomerVerificationUnavailable { .. })));
    }

    #[test]
    fn test_refusal_without_reason_fails_closed() {
        let mut answer = CheckAccountLimitResponse::allowed(&AccountHoldings::default());
        answer.can_create_account = false;
        let result = interpret_limit(&number(), answer);
        assert!(matches!(result, Err(AccountError::CustomerVerificationUnavailable { .. })));
    }

    #[test]
    fn test_limit_denials_map_to_business_errors() {
        let holdings = AccountHoldings { total_accounts: 10, active_accounts: 10, has_salary_account: false };
        let answer = CheckAccountLimitResponse::denied(
            &holdings,
            &Ineligibility::ActiveLimitReached { active: 10, limit: 10 },
        );
        assert_eq!(
            interpret_limit(&number(), answer),
            Err(AccountError::AccountLimitExceeded { customer_number: number(), limit: 10 })
        );

        let salary = AccountNumber::parse("1234567004").unwrap();
        let answer = CheckAccountLimitResponse::denied(&holdings, &Ineligibility::SalaryAccountExists)
            .with_salary_account(Some(salary.clone()));
        assert_eq!(
            interpret_limit(&number(), answer),
            Err(AccountError::SalaryAccountAlreadyExists { customer_number: number(), existing_account: Some(salary) })
        );
    }

    #[test]
    fn test_not_active_denial_reports_remote_status() {
        let answer = CheckAccountLimitResponse::not_active(CustomerStatus::Suspended);
        assert_eq!(
            interpret_limit(&number(), answer),
            Err(AccountError::CustomerNotActive { customer_number: number(), status: CustomerStatus::Suspended })
        );
    }

    /// Every customer is ACTIVE and every limit check passes.
    struct OpenDoor;

    #[async_trait::async_trait]
    impl CustomerGateway for OpenDoor {
        async fn validate_customer(
            &self,
            _ctx: &CallContext,
            _customer_number: &CustomerNumber,
        ) -> Result<ValidateCustomerResponse, RpcError> {
            Ok(ValidateCustomerResponse::found(CustomerStatus::Active))
        }

        async fn check_account_limit(
            &self,
            _ctx: &CallContext,
            _customer_number: &CustomerNumber,
            _account_type: AccountType,
        ) -> Result<CheckAccountLimitResponse, RpcError> {
            Ok(CheckAccountLimitResponse::allowed(&AccountHoldings::default()))
        }

        async fn get_customer(
            &self,
            _ctx: &CallContext,
            _customer_number: &CustomerNumber,
        ) -> Result<Option<crate::rpc::CustomerProjection>, RpcError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_creation_locks_are_released_after_each_request() {
        let service = AccountService::new(
            Arc::new(crate::persistence::InMemoryAccountStore::new()),
            Arc::new(OpenDoor),
            LimitCheck::Remote,
            Arc::new(Metrics::new().unwrap()),
        );
        let ctx = CallContext::with_timeout(std::time::Duration::from_secs(2));

        for seed in 0..50u32 {
            let customer = CustomerNumber::parse((2000000 + seed).to_string()).unwrap();
            service.create_account(&ctx, &customer, AccountType::Saving).await.unwrap();
            service.create_account(&ctx, &customer, AccountType::Salary).await.unwrap();
            assert!(service.create_account(&ctx, &customer, AccountType::Salary).await.is_err());
        }

        assert!(service.creation_locks.is_empty());
    }

    #[test]
    fn test_limit_check_mode_parses() {
        assert_eq!("REMOTE".parse::<LimitCheck>(), Ok(LimitCheck::Remote));
        assert_eq!(" local ".parse::<LimitCheck>(), Ok(LimitCheck::Local));
        assert!("both".parse::<LimitCheck>().is_err());
    }
}
