use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::metrics::Metrics;

use super::publisher::{dispatch, EventConsumer, EventPublisher, PublishedEvent};

// ============================================================================
// In-Process Event Bus
// ============================================================================
//
// Broadcast channel standing in for the broker when no Kafka brokers are
// configured. Every subscriber sees every event; a slow subscriber that
// lags behind the channel capacity skips the events it missed.
//
// ============================================================================

#[derive(Clone)]
pub struct InProcessBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl InProcessBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Run `consumer` against every event published from now on.
    pub fn spawn_consumer(&self, consumer: Arc<dyn EventConsumer>, metrics: Arc<Metrics>) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            tracing::info!(consumer = consumer.name(), "Event consumer subscribed to in-process bus");
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        dispatch(consumer.as_ref(), &event).await;
                        if consumer.topics().contains(&event.topic.as_str()) {
                            metrics.record_event_consumed(consumer.name(), &event.topic);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(consumer = consumer.name(), skipped = skipped, "Event consumer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::info!(consumer = consumer.name(), "Event consumer stopped");
        })
    }
}

#[async_trait]
impl EventPublisher for InProcessBus {
    fn name(&self) -> &str {
        "in-process"
    }

    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()> {
        let event = PublishedEvent {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_string(),
        };
        // No subscriber is not an error for fire-and-forget events.
        if self.sender.send(event).is_err() {
            tracing::debug!(topic = %topic, "Published with no subscribers");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<PublishedEvent>>,
    }

    #[async_trait]
    impl EventConsumer for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn topics(&self) -> &'static [&'static str] {
            &["wanted"]
        }

        async fn handle(&self, event: &PublishedEvent) -> anyhow::Result<()> {
            self.seen.lock().await.push(event.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = InProcessBus::new(16);
        let mut receiver = bus.subscribe();

        bus.publish("account.events.created", "1234567001", "{}").await.unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.topic, "account.events.created");
        assert_eq!(event.key, "1234567001");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let bus = InProcessBus::new(4);
        assert!(bus.publish("t", "k", "p").await.is_ok());
    }

    #[tokio::test]
    async fn test_consumer_only_sees_its_topics() {
        let bus = InProcessBus::new(16);
        let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        let metrics = Arc::new(Metrics::new().unwrap());
        bus.spawn_consumer(recorder.clone(), metrics);

        bus.publish("ignored", "k", "1").await.unwrap();
        bus.publish("wanted", "k", "2").await.unwrap();

        for _ in 0..50 {
            if !recorder.seen.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let seen = recorder.seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].payload, "2");
    }
}
