use actix::prelude::*;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::actors::core::{ComponentHealth, HealthStatus};
use crate::messaging::EventPublisher;
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitState};

// ============================================================================
// Health Monitor Actor - Monitors system health
// ============================================================================
//
// Responsibilities:
// - Track health status reported by the other actors
// - Probe circuit breakers (RPC gateways, event publisher) periodically
// - Aggregate system-wide health for the /health endpoint
//
// ============================================================================

const PROBE_INTERVAL: Duration = Duration::from_secs(10);

/// Something whose circuit state the monitor polls.
#[derive(Clone)]
pub enum HealthProbe {
    Breaker(CircuitBreaker),
    Publisher(Arc<dyn EventPublisher>),
}

impl HealthProbe {
    fn component(&self) -> String {
        match self {
            HealthProbe::Breaker(breaker) => format!("circuit:{}", breaker.name()),
            HealthProbe::Publisher(publisher) => format!("publisher:{}", publisher.name()),
        }
    }

    async fn circuit_state(&self) -> Option<CircuitState> {
        match self {
            HealthProbe::Breaker(breaker) => Some(breaker.get_state().await),
            HealthProbe::Publisher(publisher) => publisher.circuit_state().await,
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

#[derive(Message)]
#[rtype(result = "SystemHealth")]
pub struct GetSystemHealth;

/// Run every probe now instead of waiting for the next tick.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ProbeNow;

#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: DateTime<Utc>,
}

// ============================================================================
// Health Monitor Actor
// ============================================================================

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    probes: Vec<HealthProbe>,
    metrics: Arc<Metrics>,
}

impl HealthMonitorActor {
    pub fn new(probes: Vec<HealthProbe>, metrics: Arc<Metrics>) -> Self {
        Self {
            components: HashMap::new(),
            probes,
            metrics,
        }
    }

    fn compute_overall_status(&self) -> HealthStatus {
        let mut has_degraded = false;
        let mut unhealthy_components = Vec::new();

        for (name, health) in &self.components {
            match &health.status {
                HealthStatus::Unhealthy(msg) => {
                    unhealthy_components.push(format!("{}: {}", name, msg));
                }
                HealthStatus::Degraded(_) => {
                    has_degraded = true;
                }
                HealthStatus::Healthy => {}
            }
        }

        if !unhealthy_components.is_empty() {
            unhealthy_components.sort();
            HealthStatus::Unhealthy(unhealthy_components.join(", "))
        } else if has_degraded {
            HealthStatus::Degraded("Some components degraded".to_string())
        } else {
            HealthStatus::Healthy
        }
    }

    fn probe(&self, ctx: &mut Context<Self>) {
        let probes = self.probes.clone();
        let me = ctx.address();
        ctx.spawn(
            async move {
                for probe in probes {
                    let state = probe.circuit_state().await;
                    me.do_send(UpdateHealth {
                        component: probe.component(),
                        status: HealthStatus::from_circuit(state),
                        details: state.map(|s| format!("circuit {}", s.as_str())),
                    });
                }
            }
            .into_actor(self),
        );
    }
}

impl Actor for HealthMonitorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(probes = self.probes.len(), "HealthMonitorActor started");
        self.probe(ctx);
        ctx.run_interval(PROBE_INTERVAL, |act, ctx| act.probe(ctx));
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Handler<UpdateHealth> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, msg: UpdateHealth, _ctx: &mut Self::Context) -> Self::Result {
        tracing::debug!(
            component = %msg.component,
            status = ?msg.status,
            "Updated component health"
        );

        let mut health = ComponentHealth::new(msg.component.clone(), msg.status);
        if let Some(details) = msg.details {
            health = health.with_details(details);
        }
        self.components.insert(msg.component, health);
        self.metrics.actor_health_status.set(self.compute_overall_status().code());
    }
}

impl Handler<GetSystemHealth> for HealthMonitorActor {
    type Result = MessageResult<GetSystemHealth>;

    fn handle(&mut self, _msg: GetSystemHealth, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(SystemHealth {
            overall_status: self.compute_overall_status(),
            components: self.components.clone(),
            check_time: Utc::now(),
        })
    }
}

impl Handler<ProbeNow> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, _msg: ProbeNow, ctx: &mut Self::Context) -> Self::Result {
        self.probe(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::CircuitBreakerConfig;

    #[actix::test]
    async fn test_overall_status_is_worst_component() {
        let monitor = HealthMonitorActor::new(Vec::new(), Arc::new(Metrics::new().unwrap())).start();

        monitor
            .send(UpdateHealth { component: "outbox_relay:account".into(), status: HealthStatus::Healthy, details: None })
            .await
            .unwrap();
        let health = monitor.send(GetSystemHealth).await.unwrap();
        assert!(health.overall_status.is_healthy());

        monitor
            .send(UpdateHealth {
                component: "publisher:redpanda".into(),
                status: HealthStatus::Unhealthy("Circuit breaker open".into()),
                details: None,
            })
            .await
            .unwrap();
        let health = monitor.send(GetSystemHealth).await.unwrap();
        assert!(health.overall_status.is_unhealthy());
        assert_eq!(health.components.len(), 2);
    }

    #[actix::test]
    async fn test_open_breaker_is_reported_unhealthy() {
        let config = CircuitBreakerConfig { failure_threshold: 1, ..Default::default() };
        let breaker = CircuitBreaker::new("customer-service", config);
        let _ = breaker.call(async { Err::<(), _>("down") }).await;

        let metrics = Arc::new(Metrics::new().unwrap());
        let monitor = HealthMonitorActor::new(vec![HealthProbe::Breaker(breaker)], metrics.clone()).start();

        let mut health = monitor.send(GetSystemHealth).await.unwrap();
        for _ in 0..50 {
            if !health.components.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            health = monitor.send(GetSystemHealth).await.unwrap();
        }

        let component = &health.components["circuit:customer-service"];
        assert!(component.status.is_unhealthy());
        assert_eq!(metrics.actor_health_status.get(), 0);
    }
}
