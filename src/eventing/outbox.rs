use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::core::{serialize_event, DomainEvent, EventEnvelope};

// ============================================================================
// Transactional Outbox
// ============================================================================
//
// Stores write one OutboxMessage per event in the same critical section as
// the aggregate row. The relay actor drains pending messages through an
// OutboxSource and publishes them; delivery is at-least-once.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub event_id: Uuid,
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub aggregate_version: i64,
    pub event_type: String,
    pub topic: String,
    pub partition_key: String,
    /// The full serialized envelope.
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl OutboxMessage {
    pub fn from_envelope<E: DomainEvent>(envelope: &EventEnvelope<E>) -> serde_json::Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            event_id: envelope.event_id,
            aggregate_id: envelope.aggregate_id.clone(),
            aggregate_type: envelope.aggregate_type.clone(),
            aggregate_version: envelope.aggregate_version,
            event_type: envelope.event_type.clone(),
            topic: envelope.topic().to_string(),
            partition_key: envelope.aggregate_id.clone(),
            payload: serialize_event(envelope)?,
            created_at: envelope.timestamp,
            attempts: 0,
            last_error: None,
        })
    }
}

/// Where the relay reads pending messages from.
#[async_trait]
pub trait OutboxSource: Send + Sync {
    /// Label used in logs and metrics.
    fn name(&self) -> &str;

    /// Oldest-first messages that are neither published nor dead-lettered.
    async fn fetch_pending(&self, limit: usize) -> anyhow::Result<Vec<OutboxMessage>>;

    async fn mark_published(&self, id: Uuid) -> anyhow::Result<()>;

    /// Records a failed publish and returns the attempt count so far.
    async fn record_failure(&self, id: Uuid, error: &str) -> anyhow::Result<u32>;

    /// Removes the message from the pending set after it was handed to the DLQ.
    async fn mark_dead_lettered(&self, id: Uuid) -> anyhow::Result<()>;
}
