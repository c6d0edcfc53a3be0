//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the tracer.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the instrumented server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TracerConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Operation naming behaviour.
    pub naming: NamingConfig,

    /// Deferred sampling settings.
    pub sampling: SamplingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Operation naming configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NamingConfig {
    /// Derive operation names from matched routes.
    pub automatic: bool,

    /// Name given to every request span when it starts.
    pub default_operation_name: String,

    /// Name given to requests that no route handled.
    pub unhandled_operation_name: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            automatic: true,
            default_operation_name: "http.server.request".to_string(),
            unhandled_operation_name: "unhandled".to_string(),
        }
    }
}

/// Sampling strategy applied when a span takes its sampling decision.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    /// Keep every trace.
    Always,
    /// Drop every trace.
    Never,
    /// Keep a random fraction of traces (see `SamplingConfig::ratio`).
    Random,
}

/// Deferred sampling configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    /// Strategy used when no per-operation override matches.
    pub strategy: SamplingStrategy,

    /// Fraction of traces kept by the `random` strategy (0.0 to 1.0).
    pub ratio: f64,

    /// Per-operation-name overrides.
    pub operations: HashMap<String, SamplingStrategy>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::Always,
            ratio: 1.0,
            operations: HashMap::new(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: TracerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.naming.automatic);
        assert_eq!(config.sampling.strategy, SamplingStrategy::Always);
    }

    #[test]
    fn parses_sampling_overrides() {
        let config: TracerConfig = toml::from_str(
            r#"
            [sampling]
            strategy = "random"
            ratio = 0.25

            [sampling.operations]
            "/health" = "never"
            "/api/v1/users/{}/orders" = "always"
            "#,
        )
        .unwrap();

        assert_eq!(config.sampling.strategy, SamplingStrategy::Random);
        assert_eq!(config.sampling.ratio, 0.25);
        assert_eq!(
            config.sampling.operations.get("/health"),
            Some(&SamplingStrategy::Never)
        );
    }
}
