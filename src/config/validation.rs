//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ratios, limits, timeouts)
//! - Check that addresses parse and names are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TracerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::TracerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    EmptyName { field: &'static str },

    #[error("sampling.ratio must be within 0.0..=1.0, got {0}")]
    RatioOutOfRange(f64),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &TracerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_connections" });
    }

    if config.naming.default_operation_name.trim().is_empty() {
        errors.push(ValidationError::EmptyName { field: "naming.default_operation_name" });
    }
    if config.naming.unhandled_operation_name.trim().is_empty() {
        errors.push(ValidationError::EmptyName { field: "naming.unhandled_operation_name" });
    }

    let ratio = config.sampling.ratio;
    if !(0.0..=1.0).contains(&ratio) {
        errors.push(ValidationError::RatioOutOfRange(ratio));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
