// ============================================================================
// Messaging - integration events between the two services
// ============================================================================

mod bus;
mod kafka_consumer;
mod publisher;
mod redpanda;

pub use bus::InProcessBus;
pub use kafka_consumer::KafkaEventSource;
pub use publisher::{dispatch, EventConsumer, EventPublisher, PublishedEvent};
pub use redpanda::RedpandaClient;
