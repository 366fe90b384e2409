// ============================================================================
// Cross-Service Calls
// ============================================================================
//
// - contracts/ - request/response shapes and the two gateway traits
// - context/   - per-request deadline and correlation id
// - handlers/  - server side of each surface
// - guarded/   - client side: deadline, circuit breaker, retry
//
// ============================================================================

mod context;
mod contracts;
mod guarded;
mod handlers;

pub use context::CallContext;
pub use contracts::{
    AccountGateway, AccountInfo, AccountSummary, ActiveAccounts, CheckAccountLimitResponse, CustomerGateway,
    CustomerProjection, LimitDenial, RpcError, ValidateCustomerResponse,
};
pub use guarded::{GuardedAccountGateway, GuardedCustomerGateway, RpcGuard};
pub use handlers::{AccountRpcHandler, CustomerRpcHandler};
