//! Span factory shared by every instrumented listener.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::{NamingConfig, TracerConfig};
use crate::observability::reporter::SpanReporter;
use crate::observability::sampler::Sampler;
use crate::observability::span::DeferredSpan;

/// Creates request spans and holds the hot-reloadable naming and
/// sampling settings.
#[derive(Debug)]
pub struct Tracer {
    naming: ArcSwap<NamingConfig>,
    sampler: ArcSwap<Sampler>,
    reporter: Arc<dyn SpanReporter>,
}

impl Tracer {
    pub fn new(config: &TracerConfig, reporter: Arc<dyn SpanReporter>) -> Self {
        Self {
            naming: ArcSwap::from_pointee(config.naming.clone()),
            sampler: ArcSwap::from_pointee(Sampler::from_config(&config.sampling)),
            reporter,
        }
    }

    /// Naming settings in effect right now.
    pub fn naming(&self) -> Arc<NamingConfig> {
        self.naming.load_full()
    }

    /// Start a span named after the configured default operation.
    ///
    /// The span keeps the sampler that was active when it started.
    pub fn start_span(&self) -> Arc<DeferredSpan> {
        let naming = self.naming.load();
        Arc::new(DeferredSpan::new(
            &naming.default_operation_name,
            self.sampler.load_full(),
            Arc::clone(&self.reporter),
        ))
    }

    /// Apply naming and sampling settings from a reloaded configuration.
    pub fn reconfigure(&self, config: &TracerConfig) {
        self.naming.store(Arc::new(config.naming.clone()));
        self.sampler
            .store(Arc::new(Sampler::from_config(&config.sampling)));
        tracing::info!(
            automatic_naming = config.naming.automatic,
            strategy = ?config.sampling.strategy,
            "Tracer reconfigured"
        );
    }
}
