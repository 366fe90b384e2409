use actix::prelude::*;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

use crate::metrics::Metrics;

// ============================================================================
// Dead Letter Queue Actor
// ============================================================================
//
// Holds outbox messages that could not be published within the configured
// number of attempts, so an operator can inspect them. Oldest entries are
// evicted once the queue reaches capacity.
//
// ============================================================================

pub const DEFAULT_DLQ_CAPACITY: usize = 10_000;

pub struct DlqActor {
    messages: VecDeque<DlqMessage>,
    capacity: usize,
    metrics: Arc<Metrics>,
}

impl DlqActor {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self::with_capacity(DEFAULT_DLQ_CAPACITY, metrics)
    }

    pub fn with_capacity(capacity: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity: capacity.max(1),
            metrics,
        }
    }
}

impl Actor for DlqActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(capacity = self.capacity, "DlqActor started - Dead Letter Queue ready");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<(), String>")]
pub struct AddToDlq {
    /// Outbox message id.
    pub id: Uuid,
    pub event_id: Uuid,
    pub source: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub topic: String,
    pub payload: String,
    pub error_message: String,
    pub failure_count: u32,
    pub first_failed_at: DateTime<Utc>,
}

#[derive(Message)]
#[rtype(result = "Vec<DlqMessage>")]
pub struct GetDlqMessages {
    pub limit: usize,
}

#[derive(Message)]
#[rtype(result = "DlqStats")]
pub struct GetDlqStats;

#[derive(Debug, Clone, serde::Serialize)]
pub struct DlqMessage {
    pub id: Uuid,
    pub event_id: Uuid,
    pub source: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub topic: String,
    pub payload: String,
    pub error_message: String,
    pub failure_count: u32,
    pub first_failed_at: DateTime<Utc>,
    pub dead_lettered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct DlqStats {
    pub total_messages: usize,
    pub by_event_type: HashMap<String, usize>,
}

// ============================================================================
// Handlers
// ============================================================================

impl Handler<AddToDlq> for DlqActor {
    type Result = Result<(), String>;

    fn handle(&mut self, msg: AddToDlq, _: &mut Self::Context) -> Self::Result {
        tracing::error!(
            event_id = %msg.event_id,
            event_type = %msg.event_type,
            aggregate_id = %msg.aggregate_id,
            source = %msg.source,
            error = %msg.error_message,
            failure_count = msg.failure_count,
            "💀 Adding message to Dead Letter Queue"
        );

        if self.messages.iter().any(|m| m.id == msg.id) {
            return Ok(());
        }
        if self.messages.len() >= self.capacity {
            if let Some(evicted) = self.messages.pop_front() {
                tracing::warn!(event_id = %evicted.event_id, "Dead Letter Queue full, evicting oldest entry");
            }
        }

        self.metrics.record_dlq_message(&msg.event_type);
        self.messages.push_back(DlqMessage {
            id: msg.id,
            event_id: msg.event_id,
            source: msg.source,
            aggregate_id: msg.aggregate_id,
            event_type: msg.event_type,
            topic: msg.topic,
            payload: msg.payload,
            error_message: msg.error_message,
            failure_count: msg.failure_count,
            first_failed_at: msg.first_failed_at,
            dead_lettered_at: Utc::now(),
        });
        Ok(())
    }
}

impl Handler<GetDlqMessages> for DlqActor {
    type Result = MessageResult<GetDlqMessages>;

    fn handle(&mut self, msg: GetDlqMessages, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.messages.iter().take(msg.limit).cloned().collect())
    }
}

impl Handler<GetDlqStats> for DlqActor {
    type Result = MessageResult<GetDlqStats>;

    fn handle(&mut self, _msg: GetDlqStats, _: &mut Self::Context) -> Self::Result {
        let mut by_event_type = HashMap::new();
        for message in &self.messages {
            *by_event_type.entry(message.event_type.clone()).or_insert(0) += 1;
        }
        MessageResult(DlqStats {
            total_messages: self.messages.len(),
            by_event_type,
        })
    }
}
