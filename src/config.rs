use std::str::FromStr;
use std::time::Duration;

use crate::actors::RelayConfig;
use crate::services::LimitCheck;
use crate::utils::{CircuitBreakerConfig, RetryConfig};

// ============================================================================
// Application Configuration
// ============================================================================
//
// Every value has a default, so the binary starts with an empty
// environment. A `.env` file in the working directory is loaded first.
//
//   ACCOUNT_API_PORT          8081
//   CUSTOMER_API_PORT         8082
//   METRICS_PORT              9090
//   RPC_TIMEOUT_MS            2000
//   BREAKER_FAILURE_THRESHOLD 5
//   BREAKER_RESET_TIMEOUT_MS  30000
//   BREAKER_SUCCESS_THRESHOLD 2
//   RPC_RETRY_ATTEMPTS        3
//   RPC_RETRY_BASE_DELAY_MS   (RetryConfig::rpc)
//   OUTBOX_POLL_INTERVAL_MS   500
//   OUTBOX_BATCH_SIZE         100
//   OUTBOX_MAX_ATTEMPTS       5
//   KAFKA_BROKERS             (unset: in-process bus)
//   KAFKA_GROUP_PREFIX        bank_ms
//   CUSTOMER_NUMBER_SEED      1000000
//   LIMIT_CHECK               remote | local
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub account_api_port: u16,
    pub customer_api_port: u16,
    pub metrics_port: u16,
    pub rpc_timeout: Duration,
    pub circuit_breaker: CircuitBreakerConfig,
    pub rpc_retry: RetryConfig,
    pub relay: RelayConfig,
    pub kafka_brokers: Option<String>,
    pub kafka_group_prefix: String,
    pub customer_number_seed: u32,
    pub limit_check: LimitCheck,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            account_api_port: 8081,
            customer_api_port: 8082,
            metrics_port: 9090,
            rpc_timeout: Duration::from_millis(2000),
            circuit_breaker: CircuitBreakerConfig::default(),
            rpc_retry: RetryConfig::rpc(),
            relay: RelayConfig::default(),
            kafka_brokers: None,
            kafka_group_prefix: "bank_ms".to_string(),
            customer_number_seed: 1_000_000,
            limit_check: LimitCheck::Remote,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors if file doesn't exist)
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let millis = |key: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            Ok(Duration::from_millis(parsed(key, get(key), default.as_millis() as u64)?))
        };

        let circuit_breaker = CircuitBreakerConfig {
            failure_threshold: parsed(
                "BREAKER_FAILURE_THRESHOLD",
                get("BREAKER_FAILURE_THRESHOLD"),
                defaults.circuit_breaker.failure_threshold,
            )?,
            timeout: millis("BREAKER_RESET_TIMEOUT_MS", defaults.circuit_breaker.timeout)?,
            success_threshold: parsed(
                "BREAKER_SUCCESS_THRESHOLD",
                get("BREAKER_SUCCESS_THRESHOLD"),
                defaults.circuit_breaker.success_threshold,
            )?,
        };

        let rpc_retry = RetryConfig {
            max_attempts: parsed("RPC_RETRY_ATTEMPTS", get("RPC_RETRY_ATTEMPTS"), defaults.rpc_retry.max_attempts)?,
            initial_delay: millis("RPC_RETRY_BASE_DELAY_MS", defaults.rpc_retry.initial_delay)?,
            ..defaults.rpc_retry.clone()
        };

        let relay = RelayConfig {
            poll_interval: millis("OUTBOX_POLL_INTERVAL_MS", defaults.relay.poll_interval)?,
            batch_size: parsed("OUTBOX_BATCH_SIZE", get("OUTBOX_BATCH_SIZE"), defaults.relay.batch_size)?,
            max_attempts: parsed("OUTBOX_MAX_ATTEMPTS", get("OUTBOX_MAX_ATTEMPTS"), defaults.relay.max_attempts)?,
        };

        let limit_check = match get("LIMIT_CHECK") {
            Some(raw) => raw.parse::<LimitCheck>().map_err(|reason| ConfigError::InvalidValue {
                key: "LIMIT_CHECK",
                value: raw.clone(),
                reason,
            })?,
            None => defaults.limit_check,
        };

        let config = Self {
            account_api_port: parsed("ACCOUNT_API_PORT", get("ACCOUNT_API_PORT"), defaults.account_api_port)?,
            customer_api_port: parsed("CUSTOMER_API_PORT", get("CUSTOMER_API_PORT"), defaults.customer_api_port)?,
            metrics_port: parsed("METRICS_PORT", get("METRICS_PORT"), defaults.metrics_port)?,
            rpc_timeout: millis("RPC_TIMEOUT_MS", defaults.rpc_timeout)?,
            circuit_breaker,
            rpc_retry,
            relay,
            kafka_brokers: get("KAFKA_BROKERS"),
            kafka_group_prefix: get("KAFKA_GROUP_PREFIX").unwrap_or_else(|| defaults.kafka_group_prefix.clone()),
            customer_number_seed: parsed(
                "CUSTOMER_NUMBER_SEED",
                get("CUSTOMER_NUMBER_SEED"),
                defaults.customer_number_seed,
            )?,
            limit_check,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1_000_000..=9_999_999).contains(&self.customer_number_seed) {
            return Err(ConfigError::InvalidValue {
                key: "CUSTOMER_NUMBER_SEED",
                value: self.customer_number_seed.to_string(),
                reason: "must be a 7-digit number".to_string(),
            });
        }
        if self.relay.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OUTBOX_BATCH_SIZE",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.relay.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OUTBOX_MAX_ATTEMPTS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn parsed<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
