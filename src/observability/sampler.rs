//! Deferred sampling.
//!
//! # Responsibilities
//! - Decide whether a trace is kept, given its final operation name
//! - Apply per-operation overrides before the default strategy
//!
//! # Design Decisions
//! - Consulted only when a span takes its decision, so the operation name
//!   is as specific as routing allowed
//! - Random sampling uses fastrand (cheap, thread-local state)

use std::collections::HashMap;

use crate::config::{SamplingConfig, SamplingStrategy};

/// Whether a trace is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingDecision {
    Sample,
    DoNotSample,
}

impl SamplingDecision {
    pub fn is_sampled(self) -> bool {
        self == SamplingDecision::Sample
    }
}

/// Operation-name aware sampler.
#[derive(Debug, Clone)]
pub struct Sampler {
    strategy: SamplingStrategy,
    ratio: f64,
    operations: HashMap<String, SamplingStrategy>,
}

impl Sampler {
    pub fn from_config(config: &SamplingConfig) -> Self {
        Self {
            strategy: config.strategy,
            ratio: config.ratio.clamp(0.0, 1.0),
            operations: config.operations.clone(),
        }
    }

    pub fn always() -> Self {
        Self::from_config(&SamplingConfig::default())
    }

    pub fn never() -> Self {
        Self::from_config(&SamplingConfig {
            strategy: SamplingStrategy::Never,
            ..SamplingConfig::default()
        })
    }

    /// Decide for a trace whose root operation is `operation_name`.
    pub fn decide(&self, operation_name: &str) -> SamplingDecision {
        let strategy = self
            .operations
            .get(operation_name)
            .copied()
            .unwrap_or(self.strategy);

        let sampled = match strategy {
            SamplingStrategy::Always => true,
            SamplingStrategy::Never => false,
            SamplingStrategy::Random => fastrand::f64() < self.ratio,
        };

        if sampled {
            SamplingDecision::Sample
        } else {
            SamplingDecision::DoNotSample
        }
    }
}
