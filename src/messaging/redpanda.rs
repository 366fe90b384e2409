use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord},
};
use std::sync::Arc;
use std::time::Duration;

use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};

use super::publisher::EventPublisher;

// ============================================================================
// Redpanda / Kafka Publisher
// ============================================================================

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RedpandaClient {
    producer: FutureProducer,
    circuit_breaker: CircuitBreaker,
}

impl RedpandaClient {
    pub fn new(brokers: &str, breaker: CircuitBreakerConfig, metrics: Arc<Metrics>) -> anyhow::Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("enable.idempotence", "true")
            .create()?;

        tracing::info!(brokers = %brokers, "Redpanda producer created");

        Ok(Self {
            producer,
            circuit_breaker: CircuitBreaker::new("redpanda", breaker).with_metrics(metrics),
        })
    }

    pub async fn reset_circuit_breaker(&self) {
        self.circuit_breaker.reset().await;
    }
}

#[async_trait]
impl EventPublisher for RedpandaClient {
    fn name(&self) -> &str {
        "redpanda"
    }

    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()> {
        // Use circuit breaker to protect against Redpanda failures
        let result = self
            .circuit_breaker
            .call(async {
                let record = FutureRecord::to(topic).key(key).payload(payload);

                self.producer
                    .send(record, rdkafka::util::Timeout::After(SEND_TIMEOUT))
                    .await
                    .map_err(|(e, _)| anyhow::anyhow!("Kafka send error: {}", e))?;

                Ok::<(), anyhow::Error>(())
            })
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(topic = %topic, key = %key, "Published to Redpanda");
                Ok(())
            }
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::error!(topic = %topic, "Circuit breaker open - Redpanda unavailable");
                Err(anyhow::anyhow!("Circuit breaker open for Redpanda"))
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(error = %e, topic = %topic, "Failed to publish to Redpanda");
                Err(e)
            }
        }
    }

    async fn circuit_state(&self) -> Option<CircuitState> {
        Some(self.circuit_breaker.get_state().await)
    }
}
