// ============================================================================
// Eventing Core - generic aggregate and event abstractions
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::Aggregate;
pub use event::{deserialize_event, serialize_event, DomainEvent, EventEnvelope, EventMetadata};
