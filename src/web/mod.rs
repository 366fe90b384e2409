// ============================================================================
// Web Layer - REST surfaces of both services (actix-web)
// ============================================================================
//
// /api/accounts   served by the Account service
// /api/customers  served by the Customer service
//
// Handlers parse raw input into value objects, build one CallContext per
// request and return domain errors directly; ResponseError renders them.
//
// ============================================================================

mod account_api;
mod customer_api;
mod dto;
mod errors;

use actix_web::HttpRequest;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::rpc::CallContext;

pub use account_api::account_routes;
pub use customer_api::customer_routes;
pub use dto::*;
pub use errors::{json_config, ErrorBody};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Per-request settings shared by both APIs.
#[derive(Debug, Clone, Copy)]
pub struct ApiSettings {
    pub request_timeout: Duration,
}

impl ApiSettings {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    /// Deadline for everything this request triggers; reuses the caller's correlation id when valid.
    pub fn call_context(&self, req: &HttpRequest) -> CallContext {
        let correlation_id = req
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .unwrap_or_else(Uuid::new_v4);
        CallContext::with_deadline(Instant::now() + self.request_timeout, correlation_id)
    }
}
