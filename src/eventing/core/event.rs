use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

// ============================================================================
// Event Envelope - metadata around every published domain event
// ============================================================================
//
// Generic over the payload type. The envelope is what lands in the outbox
// and on the wire; consumers dedupe on `event_id`.
//
// ============================================================================

/// Request-scoped identifiers carried into every event produced by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMetadata {
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}

impl EventMetadata {
    pub fn new(correlation_id: Uuid) -> Self {
        Self { correlation_id, causation_id: None }
    }

    pub fn with_causation(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new(Uuid::new_v4())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    // Event Identity
    pub event_id: Uuid,
    /// Business key of the aggregate (account or customer number).
    pub aggregate_id: String,
    pub aggregate_type: String,
    /// Row version of the aggregate after the commit that produced this event.
    pub aggregate_version: i64,

    // Event Type Information
    pub event_type: String,
    pub event_version: i32,

    // Event Payload
    pub event_data: E,

    // Causation & Correlation
    pub causation_id: Option<Uuid>,
    pub correlation_id: Uuid,

    // Timing
    pub timestamp: DateTime<Utc>,

    pub metadata: HashMap<String, String>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(
        aggregate_id: impl Into<String>,
        aggregate_version: i64,
        event_data: E,
        meta: &EventMetadata,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_id: aggregate_id.into(),
            aggregate_type: E::aggregate_type().to_string(),
            aggregate_version,
            event_type: event_data.event_type().to_string(),
            event_version: E::event_version(),
            event_data,
            causation_id: meta.causation_id,
            correlation_id: meta.correlation_id,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn topic(&self) -> &'static str {
        self.event_data.topic()
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// Implemented by each aggregate's event union.
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn aggregate_type() -> &'static str where Self: Sized;
    fn event_version() -> i32 where Self: Sized { 1 }

    /// Name of this particular variant, e.g. `AccountCreated`.
    fn event_type(&self) -> &'static str;

    /// Topic the event is routed to, e.g. `account.events.created`.
    fn topic(&self) -> &'static str;
}

// ============================================================================
// Event Serialization Helpers
// ============================================================================

pub fn serialize_event<E: Serialize>(event: &E) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn deserialize_event<E: DeserializeOwned>(json: &str) -> serde_json::Result<E> {
    serde_json::from_str(json)
}
