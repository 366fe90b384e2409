use chrono::Utc;
use uuid::Uuid;

use crate::eventing::{DomainEvent, EventEnvelope, EventMetadata, OutboxMessage};

// ============================================================================
// Outbox Table
// ============================================================================
//
// Lives inside each store's locked state so outbox rows are written in the
// same critical section as the aggregate row they describe.
//
// ============================================================================

#[derive(Debug, Default)]
pub(crate) struct OutboxTable {
    pending: Vec<OutboxMessage>,
    published: u64,
    dead_lettered: u64,
}

impl OutboxTable {
    /// Wrap events in envelopes stamped with the committed row version.
    pub(crate) fn stage<E: DomainEvent>(
        aggregate_id: &str,
        version: i64,
        events: Vec<E>,
        meta: &EventMetadata,
    ) -> serde_json::Result<Vec<OutboxMessage>> {
        events
            .into_iter()
            .map(|event| OutboxMessage::from_envelope(&EventEnvelope::new(aggregate_id, version, event, meta)))
            .collect()
    }

    pub(crate) fn append(&mut self, messages: Vec<OutboxMessage>) {
        self.pending.extend(messages);
    }

    pub(crate) fn pending(&self, limit: usize) -> Vec<OutboxMessage> {
        self.pending.iter().take(limit).cloned().collect()
    }

    pub(crate) fn mark_published(&mut self, id: Uuid) -> bool {
        let removed = self.remove(id);
        if removed {
            self.published += 1;
        }
        removed
    }

    pub(crate) fn mark_dead_lettered(&mut self, id: Uuid) -> bool {
        let removed = self.remove(id);
        if removed {
            self.dead_lettered += 1;
        }
        removed
    }

    pub(crate) fn record_failure(&mut self, id: Uuid, error: &str) -> Option<u32> {
        let message = self.pending.iter_mut().find(|m| m.id == id)?;
        message.attempts += 1;
        message.last_error = Some(format!("{} (at {})", error, Utc::now().to_rfc3339()));
        Some(message.attempts)
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn published_count(&self) -> u64 {
        self.published
    }

    fn remove(&mut self, id: Uuid) -> bool {
        let before = self.pending.len();
        self.pending.retain(|m| m.id != id);
        self.pending.len() != before
    }
}
