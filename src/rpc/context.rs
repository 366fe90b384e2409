use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::eventing::EventMetadata;

// ============================================================================
// Call Context
// ============================================================================
//
// Created once per inbound request and passed by reference through every
// downstream call. Both legs of the Account -> Customer -> Account chain
// share the same deadline.
//
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    deadline: Instant,
    correlation_id: Uuid,
}

impl CallContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn with_deadline(deadline: Instant, correlation_id: Uuid) -> Self {
        Self { deadline, correlation_id }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Metadata for events produced while serving this call.
    pub fn event_metadata(&self) -> EventMetadata {
        EventMetadata::new(self.correlation_id)
    }
}
