use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    Message,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::metrics::Metrics;

use super::publisher::{dispatch, EventConsumer, PublishedEvent};

// ============================================================================
// Kafka Event Source
// ============================================================================
//
// Feeds one EventConsumer from the broker. Offsets are committed after the
// handler ran, so a crash mid-handle redelivers (consumers dedupe).
//
// ============================================================================

pub struct KafkaEventSource {
    consumer: StreamConsumer,
}

impl KafkaEventSource {
    pub fn new(brokers: &str, group_id: &str) -> anyhow::Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("enable.partition.eof", "false")
            .set("allow.auto.create.topics", "true")
            .create()?;

        tracing::info!(brokers = %brokers, group_id = %group_id, "✅ Kafka consumer created");
        Ok(Self { consumer })
    }

    pub fn spawn(self, handler: Arc<dyn EventConsumer>, metrics: Arc<Metrics>) -> anyhow::Result<JoinHandle<()>> {
        self.consumer.subscribe(handler.topics())?;

        Ok(tokio::spawn(async move {
            tracing::info!(consumer = handler.name(), topics = ?handler.topics(), "Kafka event consumer started");
            loop {
                let message = match self.consumer.recv().await {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::error!(consumer = handler.name(), error = %e, "Kafka receive failed");
                        continue;
                    }
                };

                let payload = match message.payload_view::<str>() {
                    Some(Ok(text)) => text.to_string(),
                    _ => {
                        tracing::warn!(
                            consumer = handler.name(),
                            topic = message.topic(),
                            offset = message.offset(),
                            "Skipping message without a UTF-8 payload"
                        );
                        continue;
                    }
                };
                let key = message
                    .key()
                    .map(|k| String::from_utf8_lossy(k).into_owned())
                    .unwrap_or_default();
                let event = PublishedEvent {
                    topic: message.topic().to_string(),
                    key,
                    payload,
                };

                dispatch(handler.as_ref(), &event).await;
                metrics.record_event_consumed(handler.name(), &event.topic);

                if let Err(e) = self.consumer.commit_message(&message, CommitMode::Async) {
                    tracing::warn!(consumer = handler.name(), error = %e, "Failed to commit offset");
                }
            }
        }))
    }
}
