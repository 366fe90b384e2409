use actix::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::actors::core::{ComponentHealth, HealthCheckable, HealthStatus};
use crate::eventing::{OutboxMessage, OutboxSource};
use crate::messaging::EventPublisher;
use crate::metrics::Metrics;

use super::dlq::{AddToDlq, DlqActor};
use super::health_monitor::{HealthMonitorActor, UpdateHealth};

// ============================================================================
// Outbox Relay Actor - Polls an outbox and publishes to the broker
// ============================================================================
//
// 1. Every poll interval, fetch the oldest pending outbox messages
// 2. Publish each one keyed by its aggregate id
// 3. Mark published messages so they are not sent again
// 4. Count failures per message; after max_attempts hand it to the DLQ
//
// A message stays pending until it is published or dead-lettered, so a
// crash between publish and mark_published republishes it. Consumers
// dedupe on event_id.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub max_attempts: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            batch_size: 100,
            max_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub published: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

/// Shared plumbing of one relay, cloned into each drain future.
#[derive(Clone)]
struct Relay {
    source: Arc<dyn OutboxSource>,
    publisher: Arc<dyn EventPublisher>,
    dlq: Option<Addr<DlqActor>>,
    metrics: Arc<Metrics>,
    config: RelayConfig,
}

impl Relay {
    async fn drain(self) -> anyhow::Result<RelayReport> {
        let batch = self.source.fetch_pending(self.config.batch_size).await?;
        let mut report = RelayReport::default();

        if !batch.is_empty() {
            tracing::debug!(source = self.source.name(), message_count = batch.len(), "📬 Fetched pending outbox messages");
        }

        for message in batch {
            let started = Instant::now();
            let outcome = self
                .publisher
                .publish(&message.topic, &message.partition_key, &message.payload)
                .await;
            let elapsed = started.elapsed().as_secs_f64();

            match outcome {
                Ok(()) => {
                    self.source.mark_published(message.id).await?;
                    self.metrics
                        .record_outbox_publish(self.source.name(), &message.event_type, elapsed, true);
                    report.published += 1;
                    tracing::info!(
                        event_id = %message.event_id,
                        event_type = %message.event_type,
                        aggregate_id = %message.aggregate_id,
                        topic = %message.topic,
                        "✅ Published outbox event"
                    );
                }
                Err(e) => {
                    self.metrics
                        .record_outbox_publish(self.source.name(), &message.event_type, elapsed, false);
                    report.failed += 1;
                    let error = e.to_string();
                    let attempts = self.source.record_failure(message.id, &error).await?;
                    tracing::error!(
                        event_id = %message.event_id,
                        event_type = %message.event_type,
                        attempts = attempts,
                        max_attempts = self.config.max_attempts,
                        error = %error,
                        "❌ Failed to publish outbox event"
                    );

                    if attempts >= self.config.max_attempts && self.dead_letter(&message, attempts, error).await {
                        report.dead_lettered += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    async fn dead_letter(&self, message: &OutboxMessage, attempts: u32, error: String) -> bool {
        let Some(dlq) = &self.dlq else {
            return false;
        };
        let request = AddToDlq {
            id: message.id,
            event_id: message.event_id,
            source: self.source.name().to_string(),
            aggregate_id: message.aggregate_id.clone(),
            event_type: message.event_type.clone(),
            topic: message.topic.clone(),
            payload: message.payload.clone(),
            error_message: error,
            failure_count: attempts,
            first_failed_at: message.created_at,
        };
        match dlq.send(request).await {
            Ok(Ok(())) => match self.source.mark_dead_lettered(message.id).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(event_id = %message.event_id, error = %e, "Failed to mark message dead-lettered");
                    false
                }
            },
            Ok(Err(e)) => {
                tracing::error!(event_id = %message.event_id, error = %e, "DLQ rejected message");
                false
            }
            Err(e) => {
                tracing::error!(event_id = %message.event_id, error = %e, "DLQ actor unreachable");
                false
            }
        }
    }
}

pub struct OutboxRelay {
    relay: Relay,
    health: Option<Addr<HealthMonitorActor>>,
    draining: bool,
    consecutive_errors: u32,
    last_report: RelayReport,
}

impl OutboxRelay {
    pub fn new(
        source: Arc<dyn OutboxSource>,
        publisher: Arc<dyn EventPublisher>,
        metrics: Arc<Metrics>,
        config: RelayConfig,
    ) -> Self {
        Self {
            relay: Relay { source, publisher, dlq: None, metrics, config },
            health: None,
            draining: false,
            consecutive_errors: 0,
            last_report: RelayReport::default(),
        }
    }

    pub fn with_dlq(mut self, dlq: Addr<DlqActor>) -> Self {
        self.relay.dlq = Some(dlq);
        self
    }

    pub fn with_health_monitor(mut self, health: Addr<HealthMonitorActor>) -> Self {
        self.health = Some(health);
        self
    }

    fn record(&mut self, result: &anyhow::Result<RelayReport>) {
        match result {
            Ok(report) => {
                self.consecutive_errors = if report.failed > 0 { self.consecutive_errors + 1 } else { 0 };
                self.last_report = *report;
            }
            Err(e) => {
                self.consecutive_errors += 1;
                tracing::error!(source = self.relay.source.name(), error = %e, "Outbox relay pass failed");
            }
        }
        if let Some(health) = &self.health {
            let report = self.check_health();
            health.do_send(UpdateHealth {
                component: report.name,
                status: report.status,
                details: report.details,
            });
        }
    }

    fn poll(&mut self, ctx: &mut Context<Self>) {
        if self.draining {
            return;
        }
        self.draining = true;
        ctx.spawn(self.relay.clone().drain().into_actor(self).map(|result, act, _ctx| {
            act.draining = false;
            act.record(&result);
        }));
    }
}

impl HealthCheckable for OutboxRelay {
    fn check_health(&self) -> ComponentHealth {
        let status = match self.consecutive_errors {
            0 => HealthStatus::Healthy,
            n if n < self.relay.config.max_attempts => {
                HealthStatus::Degraded(format!("{} consecutive failed passes", n))
            }
            n => HealthStatus::Unhealthy(format!("{} consecutive failed passes", n)),
        };
        ComponentHealth::new(self.component_name(), status).with_details(format!(
            "last pass: {} published, {} failed, {} dead-lettered",
            self.last_report.published, self.last_report.failed, self.last_report.dead_lettered
        ))
    }

    fn component_name(&self) -> &str {
        match self.relay.source.name() {
            "account" => "outbox_relay:account",
            "customer" => "outbox_relay:customer",
            _ => "outbox_relay",
        }
    }
}

impl Actor for OutboxRelay {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            source = self.relay.source.name(),
            publisher = self.relay.publisher.name(),
            poll_ms = self.relay.config.poll_interval.as_millis() as u64,
            "🔄 Outbox relay started"
        );
        ctx.run_interval(self.relay.config.poll_interval, |act, ctx| act.poll(ctx));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(source = self.relay.source.name(), "Outbox relay stopped");
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Drain one batch immediately and report what happened.
#[derive(Message)]
#[rtype(result = "Result<RelayReport, String>")]
pub struct RelayNow;

impl Handler<RelayNow> for OutboxRelay {
    type Result = ResponseActFuture<Self, Result<RelayReport, String>>;

    fn handle(&mut self, _msg: RelayNow, _ctx: &mut Self::Context) -> Self::Result {
        Box::pin(self.relay.clone().drain().into_actor(self).map(|result, act, _ctx| {
            act.record(&result);
            result.map_err(|e| e.to_string())
        }))
    }
}
