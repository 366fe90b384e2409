// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for asynchronous, concurrent operations.
//
// Structure:
// - core/           - Health types shared by the actors
// - infrastructure/ - Outbox relay, DLQ, health monitor, coordinator
//
// Note: Domain logic (Account, Customer) lives in services, NOT actors.
//       Actors are reserved for infrastructure concerns only.
//
// ============================================================================

mod core;
mod infrastructure;

pub use self::core::{ComponentHealth, HealthCheckable, HealthStatus};
pub use infrastructure::{
    AddToDlq, CoordinatorActor, DlqActor, DlqMessage, DlqStats, GetDlq, GetDlqMessages, GetDlqStats,
    GetHealthMonitor, GetSystemHealth, HealthMonitorActor, HealthProbe, OutboxRelay, ProbeNow, RelayConfig,
    RelayNow, RelayReport, Shutdown, SystemHealth, UpdateHealth,
};
