use actix::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::actors::core::HealthStatus;
use crate::eventing::OutboxSource;
use crate::messaging::EventPublisher;
use crate::metrics::Metrics;

use super::dlq::DlqActor;
use super::health_monitor::{GetSystemHealth, HealthMonitorActor, HealthProbe, UpdateHealth};
use super::outbox_relay::{OutboxRelay, RelayConfig};

// ============================================================================
// Coordinator Actor - Orchestrates all infrastructure actors
// ============================================================================
//
// Actor Hierarchy:
//   CoordinatorActor (Supervisor)
//   ├── HealthMonitorActor
//   ├── DlqActor
//   └── OutboxRelay (one per outbox: account, customer)
//
// ============================================================================

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(30);

pub struct CoordinatorActor {
    sources: Vec<Arc<dyn OutboxSource>>,
    publisher: Arc<dyn EventPublisher>,
    probes: Vec<HealthProbe>,
    metrics: Arc<Metrics>,
    relay_config: RelayConfig,
    relays: Vec<Addr<OutboxRelay>>,
    health_monitor: Option<Addr<HealthMonitorActor>>,
    dlq_actor: Option<Addr<DlqActor>>,
}

impl CoordinatorActor {
    pub fn new(
        sources: Vec<Arc<dyn OutboxSource>>,
        publisher: Arc<dyn EventPublisher>,
        probes: Vec<HealthProbe>,
        metrics: Arc<Metrics>,
        relay_config: RelayConfig,
    ) -> Self {
        Self {
            sources,
            publisher,
            probes,
            metrics,
            relay_config,
            relays: Vec::new(),
            health_monitor: None,
            dlq_actor: None,
        }
    }

    fn start_child_actors(&mut self, _ctx: &mut Context<Self>) {
        tracing::info!("Starting supervised child actors");

        let mut probes = self.probes.clone();
        probes.push(HealthProbe::Publisher(self.publisher.clone()));
        let health_monitor = HealthMonitorActor::new(probes, self.metrics.clone()).start();
        self.health_monitor = Some(health_monitor.clone());

        let dlq_actor = DlqActor::new(self.metrics.clone()).start();
        self.dlq_actor = Some(dlq_actor.clone());
        health_monitor.do_send(UpdateHealth {
            component: "dlq_actor".to_string(),
            status: HealthStatus::Healthy,
            details: Some("DLQ actor started".to_string()),
        });

        for source in &self.sources {
            let relay = OutboxRelay::new(
                source.clone(),
                self.publisher.clone(),
                self.metrics.clone(),
                self.relay_config.clone(),
            )
            .with_dlq(dlq_actor.clone())
            .with_health_monitor(health_monitor.clone())
            .start();
            self.relays.push(relay);
        }

        tracing::info!(relays = self.relays.len(), "✅ All supervised actors started successfully");
    }
}

impl Actor for CoordinatorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("🎯 CoordinatorActor started");
        self.start_child_actors(ctx);

        ctx.run_interval(HEALTH_LOG_INTERVAL, |act, _ctx| {
            if let Some(ref health_monitor) = act.health_monitor {
                let health_monitor = health_monitor.clone();
                actix::spawn(async move {
                    match health_monitor.send(GetSystemHealth).await {
                        Ok(health) => match health.overall_status {
                            HealthStatus::Healthy => {
                                tracing::debug!("System health check: Healthy");
                            }
                            HealthStatus::Degraded(ref msg) => {
                                tracing::warn!("System health check: Degraded - {}", msg);
                            }
                            HealthStatus::Unhealthy(ref msg) => {
                                tracing::error!("System health check: Unhealthy - {}", msg);
                            }
                        },
                        Err(e) => {
                            tracing::error!("Failed to get system health: {}", e);
                        }
                    }
                });
            }
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        tracing::info!("🛑 CoordinatorActor stopping - initiating graceful shutdown");
        Running::Stop
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("🛑 CoordinatorActor stopped");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "Option<Addr<HealthMonitorActor>>")]
pub struct GetHealthMonitor;

#[derive(Message)]
#[rtype(result = "Option<Addr<DlqActor>>")]
pub struct GetDlq;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Shutdown;

impl Handler<GetHealthMonitor> for CoordinatorActor {
    type Result = Option<Addr<HealthMonitorActor>>;

    fn handle(&mut self, _msg: GetHealthMonitor, _ctx: &mut Self::Context) -> Self::Result {
        self.health_monitor.clone()
    }
}

impl Handler<GetDlq> for CoordinatorActor {
    type Result = Option<Addr<DlqActor>>;

    fn handle(&mut self, _msg: GetDlq, _ctx: &mut Self::Context) -> Self::Result {
        self.dlq_actor.clone()
    }
}

impl Handler<Shutdown> for CoordinatorActor {
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Received shutdown signal");

        for relay in self.relays.drain(..) {
            relay.do_send(StopActor);
        }
        if let Some(dlq_actor) = self.dlq_actor.take() {
            dlq_actor.do_send(StopActor);
        }
        if let Some(health_monitor) = self.health_monitor.take() {
            health_monitor.do_send(StopActor);
        }

        ctx.stop();
    }
}

/// Message to gracefully stop an actor
#[derive(Message)]
#[rtype(result = "()")]
struct StopActor;

impl Handler<StopActor> for OutboxRelay {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("OutboxRelay received stop signal");
        ctx.stop();
    }
}

impl Handler<StopActor> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor received stop signal");
        ctx.stop();
    }
}

impl Handler<StopActor> for DlqActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("DlqActor received stop signal");
        ctx.stop();
    }
}
