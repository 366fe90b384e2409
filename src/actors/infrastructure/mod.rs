// ============================================================================
// Infrastructure Actors
// ============================================================================
//
// - Outbox relays (one per service outbox)
// - Dead letter queue
// - Health monitoring
// - Coordination and supervision
//
// ============================================================================

mod coordinator;
mod dlq;
mod health_monitor;
mod outbox_relay;

pub use coordinator::{CoordinatorActor, GetDlq, GetHealthMonitor, Shutdown};
pub use dlq::{AddToDlq, DlqActor, DlqMessage, DlqStats, GetDlqMessages, GetDlqStats};
pub use health_monitor::{GetSystemHealth, HealthMonitorActor, HealthProbe, ProbeNow, SystemHealth, UpdateHealth};
pub use outbox_relay::{OutboxRelay, RelayConfig, RelayNow, RelayReport};
