use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::CircuitState;

// ============================================================================
// Event Publishing / Consuming Seams
// ============================================================================

/// One record on the wire: topic, partition key, serialized envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub topic: String,
    pub key: String,
    pub payload: String,
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()>;

    /// State of the publisher's circuit breaker, if it has one.
    async fn circuit_state(&self) -> Option<CircuitState> {
        None
    }
}

/// Advisory consumer of integration events. Handlers must tolerate redelivery.
#[async_trait]
pub trait EventConsumer: Send + Sync {
    fn name(&self) -> &'static str;

    fn topics(&self) -> &'static [&'static str];

    async fn handle(&self, event: &PublishedEvent) -> anyhow::Result<()>;
}

/// Deliver one event if the consumer subscribes to its topic. Errors are logged, never raised.
pub async fn dispatch(consumer: &dyn EventConsumer, event: &PublishedEvent) {
    if !consumer.topics().contains(&event.topic.as_str()) {
        return;
    }
    if let Err(e) = consumer.handle(event).await {
        tracing::error!(
            consumer = consumer.name(),
            topic = %event.topic,
            key = %event.key,
            error = %e,
            "Event consumer failed"
        );
    }
}
