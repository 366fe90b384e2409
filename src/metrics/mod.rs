// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, IntGaugeVec, Opts, Registry,
};

use crate::utils::CircuitState;

// Re-export for public API
pub use server::{metrics_routes, start_metrics_server};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Business operations (accounts opened, ledger postings, rejections)
// - Inter-service calls (outcome, latency, retries)
// - Outbox relay throughput and the dead letter queue
// - Circuit breaker state per dependency
// - Actor health status
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Business Metrics
    pub accounts_created: IntCounterVec,
    pub customers_created: IntCounterVec,
    pub ledger_transactions: IntCounterVec,
    pub business_rejections: IntCounterVec,

    // Inter-service Call Metrics
    pub rpc_requests: IntCounterVec,
    pub rpc_duration: HistogramVec,

    // Retry Metrics
    pub retry_attempts_total: IntCounterVec,
    pub retry_success: IntCounterVec,
    pub retry_failure: IntCounterVec,

    // Outbox Relay Metrics
    pub outbox_published: IntCounterVec,
    pub outbox_failed: IntCounterVec,
    pub outbox_publish_duration: HistogramVec,
    pub events_consumed: IntCounterVec,

    // DLQ Metrics
    pub dlq_messages_total: IntCounter,
    pub dlq_messages_by_event_type: IntCounterVec,

    // Circuit Breaker Metrics
    pub circuit_breaker_state: IntGaugeVec,
    pub circuit_breaker_transitions: IntCounterVec,

    // Actor Metrics
    pub actor_health_status: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Business Metrics
        let accounts_created = IntCounterVec::new(
            Opts::new("accounts_created_total", "Accounts opened"),
            &["account_type"],
        )?;
        registry.register(Box::new(accounts_created.clone()))?;

        let customers_created = IntCounterVec::new(
            Opts::new("customers_created_total", "Customers registered"),
            &["customer_type"],
        )?;
        registry.register(Box::new(customers_created.clone()))?;

        let ledger_transactions = IntCounterVec::new(
            Opts::new("ledger_transactions_total", "Credits and debits posted"),
            &["transaction_type"],
        )?;
        registry.register(Box::new(ledger_transactions.clone()))?;

        let business_rejections = IntCounterVec::new(
            Opts::new("business_rejections_total", "Requests rejected by a business rule"),
            &["service", "error_code"],
        )?;
        registry.register(Box::new(business_rejections.clone()))?;

        // Inter-service Call Metrics
        let rpc_requests = IntCounterVec::new(
            Opts::new("rpc_requests_total", "Inter-service calls by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(rpc_requests.clone()))?;

        let rpc_duration = HistogramVec::new(
            HistogramOpts::new("rpc_duration_seconds", "Inter-service call duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(rpc_duration.clone()))?;

        // Retry Metrics
        let retry_attempts_total = IntCounterVec::new(
            Opts::new("retry_attempts_total", "Total retry attempts"),
            &["operation", "attempt"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        let retry_success = IntCounterVec::new(
            Opts::new("retry_success_total", "Total successful retries"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_success.clone()))?;

        let retry_failure = IntCounterVec::new(
            Opts::new("retry_failure_total", "Total failed retries after all attempts"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_failure.clone()))?;

        // Outbox Relay Metrics
        let outbox_published = IntCounterVec::new(
            Opts::new("outbox_events_published_total", "Outbox events handed to the broker"),
            &["source", "event_type"],
        )?;
        registry.register(Box::new(outbox_published.clone()))?;

        let outbox_failed = IntCounterVec::new(
            Opts::new("outbox_events_failed_total", "Outbox publish attempts that failed"),
            &["source", "event_type"],
        )?;
        registry.register(Box::new(outbox_failed.clone()))?;

        let outbox_publish_duration = HistogramVec::new(
            HistogramOpts::new("outbox_publish_duration_seconds", "Outbox publish duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["source"],
        )?;
        registry.register(Box::new(outbox_publish_duration.clone()))?;

        let events_consumed = IntCounterVec::new(
            Opts::new("events_consumed_total", "Integration events handled by consumers"),
            &["consumer", "event_type"],
        )?;
        registry.register(Box::new(events_consumed.clone()))?;

        // DLQ Metrics
        let dlq_messages_total = IntCounter::new(
            "dlq_messages_total",
            "Total messages in dead letter queue",
        )?;
        registry.register(Box::new(dlq_messages_total.clone()))?;

        let dlq_messages_by_event_type = IntCounterVec::new(
            Opts::new("dlq_messages_by_event_type", "DLQ messages by event type"),
            &["event_type"],
        )?;
        registry.register(Box::new(dlq_messages_by_event_type.clone()))?;

        // Circuit Breaker Metrics
        let circuit_breaker_state = IntGaugeVec::new(
            Opts::new(
                "circuit_breaker_state",
                "Circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
            ),
            &["breaker"],
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let circuit_breaker_transitions = IntCounterVec::new(
            Opts::new("circuit_breaker_transitions_total", "Circuit breaker state transitions"),
            &["breaker", "from_state", "to_state"],
        )?;
        registry.register(Box::new(circuit_breaker_transitions.clone()))?;

        // Actor Metrics
        let actor_health_status = IntGauge::new(
            "actor_health_status",
            "Actor health status (0=Unhealthy, 1=Degraded, 2=Healthy)",
        )?;
        registry.register(Box::new(actor_health_status.clone()))?;

        Ok(Self {
            registry,
            accounts_created,
            customers_created,
            ledger_transactions,
            business_rejections,
            rpc_requests,
            rpc_duration,
            retry_attempts_total,
            retry_success,
            retry_failure,
            outbox_published,
            outbox_failed,
            outbox_publish_duration,
            events_consumed,
            dlq_messages_total,
            dlq_messages_by_event_type,
            circuit_breaker_state,
            circuit_breaker_transitions,
            actor_health_status,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_account_created(&self, account_type: &str) {
        self.accounts_created.with_label_values(&[account_type]).inc();
    }

    pub fn record_customer_created(&self, customer_type: &str) {
        self.customers_created.with_label_values(&[customer_type]).inc();
    }

    pub fn record_transaction(&self, transaction_type: &str) {
        self.ledger_transactions.with_label_values(&[transaction_type]).inc();
    }

    pub fn record_rejection(&self, service: &str, error_code: &str) {
        self.business_rejections.with_label_values(&[service, error_code]).inc();
    }

    /// Helper to record one inter-service call
    pub fn record_rpc(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.rpc_requests.with_label_values(&[operation, outcome]).inc();
        self.rpc_duration.with_label_values(&[operation]).observe(duration_secs);
    }

    /// Helper to record retry attempt
    pub fn record_retry_attempt(&self, operation: &str, attempt: u32) {
        self.retry_attempts_total.with_label_values(&[operation, &attempt.to_string()]).inc();
    }

    /// Helper to record retry outcome
    pub fn record_retry_outcome(&self, operation: &str, success: bool) {
        if success {
            self.retry_success.with_label_values(&[operation]).inc();
        } else {
            self.retry_failure.with_label_values(&[operation]).inc();
        }
    }

    /// Helper to record one outbox publish attempt
    pub fn record_outbox_publish(&self, source: &str, event_type: &str, duration_secs: f64, success: bool) {
        if success {
            self.outbox_published.with_label_values(&[source, event_type]).inc();
        } else {
            self.outbox_failed.with_label_values(&[source, event_type]).inc();
        }
        self.outbox_publish_duration.with_label_values(&[source]).observe(duration_secs);
    }

    pub fn record_event_consumed(&self, consumer: &str, event_type: &str) {
        self.events_consumed.with_label_values(&[consumer, event_type]).inc();
    }

    /// Helper to record DLQ message
    pub fn record_dlq_message(&self, event_type: &str) {
        self.dlq_messages_total.inc();
        self.dlq_messages_by_event_type.with_label_values(&[event_type]).inc();
    }

    /// Helper to update circuit breaker state
    pub fn update_circuit_breaker_state(&self, breaker: &str, state: CircuitState) {
        self.circuit_breaker_state.with_label_values(&[breaker]).set(state.code());
    }

    /// Helper to record circuit breaker transition
    pub fn record_circuit_breaker_transition(&self, breaker: &str, from: CircuitState, to: CircuitState) {
        self.circuit_breaker_transitions
            .with_label_values(&[breaker, from.as_str(), to.as_str()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_account_created("SAVING");
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_record_outbox_publish() {
        let metrics = Metrics::new().unwrap();
        metrics.record_outbox_publish("account", "AccountCreated", 0.05, true);
        metrics.record_outbox_publish("account", "AccountCreated", 0.05, false);

        let gathered = metrics.registry.gather();
        let published = gathered.iter().find(|m| m.name() == "outbox_events_published_total").unwrap();
        assert_eq!(published.metric[0].counter.value, Some(1.0));
        let failed = gathered.iter().find(|m| m.name() == "outbox_events_failed_total").unwrap();
        assert_eq!(failed.metric[0].counter.value, Some(1.0));
    }

    #[test]
    fn test_record_retry() {
        let metrics = Metrics::new().unwrap();
        metrics.record_retry_attempt("validate_customer", 1);
        metrics.record_retry_attempt("validate_customer", 2);
        metrics.record_retry_outcome("validate_customer", true);

        let gathered = metrics.registry.gather();
        let attempts = gathered.iter().find(|m| m.name() == "retry_attempts_total").unwrap();
        assert_eq!(attempts.metric.len(), 2); // Two different attempt labels
    }

    #[test]
    fn test_record_dlq_message() {
        let metrics = Metrics::new().unwrap();
        metrics.record_dlq_message("AccountCreated");
        metrics.record_dlq_message("CustomerUpdated");

        let gathered = metrics.registry.gather();
        let dlq_total = gathered.iter().find(|m| m.name() == "dlq_messages_total").unwrap();
        assert_eq!(dlq_total.metric[0].counter.value, Some(2.0));
    }

    #[test]
    fn test_circuit_breaker_state_is_per_breaker() {
        let metrics = Metrics::new().unwrap();
        metrics.update_circuit_breaker_state("customer-rpc", CircuitState::Open);
        metrics.update_circuit_breaker_state("account-rpc", CircuitState::Closed);
        metrics.record_circuit_breaker_transition("customer-rpc", CircuitState::Closed, CircuitState::Open);

        let gathered = metrics.registry.gather();
        let state = gathered.iter().find(|m| m.name() == "circuit_breaker_state").unwrap();
        assert_eq!(state.metric.len(), 2);
    }
}
