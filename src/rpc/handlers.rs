use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::account::AccountRepository;
use crate::domain::shared::{AccountType, CustomerNumber};
use crate::services::CustomerService;

use super::context::CallContext;
use super::contracts::{
    AccountGateway, AccountInfo, AccountSummary, ActiveAccounts, CheckAccountLimitResponse, CustomerGateway,
    CustomerProjection, RpcError, ValidateCustomerResponse,
};

// ============================================================================
// RPC Handlers - server side of each service's RPC surface
// ============================================================================
//
// In-process transport: the other service holds these behind a guarded
// gateway. A request whose deadline already passed is refused up front.
//
// ============================================================================

fn ensure_live(ctx: &CallContext, operation: &'static str) -> Result<(), RpcError> {
    if ctx.is_expired() {
        return Err(RpcError::Timeout { operation });
    }
    Ok(())
}

/// Account-summary RPC, answered straight from the account store.
pub struct AccountRpcHandler {
    repository: Arc<dyn AccountRepository>,
}

impl AccountRpcHandler {
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl AccountGateway for AccountRpcHandler {
    async fn get_account_summary(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<AccountSummary, RpcError> {
        ensure_live(ctx, "get_account_summary")?;
        let accounts = self
            .repository
            .find_by_customer(customer_number)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))?;
        AccountSummary::from_accounts(customer_number.clone(), &accounts).map_err(|e| RpcError::Remote(e.to_string()))
    }

    async fn get_accounts_by_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<Vec<AccountInfo>, RpcError> {
        ensure_live(ctx, "get_accounts_by_customer")?;
        let accounts = self
            .repository
            .find_by_customer(customer_number)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))?;
        Ok(accounts.iter().map(AccountInfo::from).collect())
    }

    async fn has_active_accounts(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<ActiveAccounts, RpcError> {
        ensure_live(ctx, "has_active_accounts")?;
        let accounts = self
            .repository
            .find_by_customer(customer_number)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))?;
        Ok(ActiveAccounts::from_accounts(&accounts))
    }
}

/// Identity/limit RPC, answered by the Customer service.
pub struct CustomerRpcHandler {
    service: Arc<CustomerService>,
}

impl CustomerRpcHandler {
    pub fn new(service: Arc<CustomerService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CustomerGateway for CustomerRpcHandler {
    async fn validate_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<ValidateCustomerResponse, RpcError> {
        ensure_live(ctx, "validate_customer")?;
        self.service
            .validate_customer(customer_number)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))
    }

    async fn check_account_limit(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
        account_type: AccountType,
    ) -> Result<CheckAccountLimitResponse, RpcError> {
        ensure_live(ctx, "check_account_limit")?;
        self.service
            .check_account_limit(ctx, customer_number, account_type)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))
    }

    async fn get_customer(
        &self,
        ctx: &CallContext,
        customer_number: &CustomerNumber,
    ) -> Result<Option<CustomerProjection>, RpcError> {
        ensure_live(ctx, "get_customer")?;
        self.service
            .customer_projection(customer_number)
            .await
            .map_err(|e| RpcError::Remote(e.to_string()))
    }
}
