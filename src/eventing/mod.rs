// ============================================================================
// Eventing Infrastructure
// ============================================================================
//
// Generic aggregate/event abstractions and the outbox message model.
// Domain-specific events live in src/domain/.
//
// ============================================================================

mod core;
mod outbox;

pub use self::core::*;
pub use outbox::{OutboxMessage, OutboxSource};
