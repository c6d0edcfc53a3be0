//! Automatic operation naming and the deferred sampling decision.
//!
//! # Responsibilities
//! - Remember the last name this layer assigned to a request span
//! - Rename the span from accumulated path matches before the response
//!   is produced, then commit the sampling decision
//! - Stay out of the way once anything else renamed the span
//!
//! # Design Decisions
//! - One `AutomaticName` per trace context; its absence disables naming
//! - Overrides are detected by comparing names by value
//! - Empty reductions never rename a span

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use opentelemetry::Context;

use crate::naming::reducer::operation_name;
use crate::observability::span::span_from;
use crate::routing::accumulator::MatchingContext;

/// Per-trace record of the last automatically assigned operation name.
#[derive(Debug)]
pub struct AutomaticName {
    last: ArcSwap<String>,
    allow_automatic: AtomicBool,
}

impl AutomaticName {
    /// State for a span currently named `initial`.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            last: ArcSwap::from_pointee(initial.into()),
            allow_automatic: AtomicBool::new(true),
        }
    }

    pub fn last(&self) -> Arc<String> {
        self.last.load_full()
    }

    pub fn remember(&self, name: impl Into<String>) {
        self.last.store(Arc::new(name.into()));
    }

    /// False once a manual override was observed.
    pub fn allows_automatic_changes(&self) -> bool {
        self.allow_automatic.load(Ordering::Acquire)
    }

    fn disallow(&self) {
        self.allow_automatic.store(false, Ordering::Release);
    }

    /// Whether `current` is still the name this state last assigned.
    fn owns(&self, current: &str) -> bool {
        if !self.allows_automatic_changes() {
            return false;
        }
        if self.last.load().as_str() != current {
            self.disallow();
            return false;
        }
        true
    }
}

/// Rename the span in `trace` from `matching` and commit its sampling
/// decision, unless automatic naming is off or was overridden.
///
/// Returns the name that was applied.
pub fn resolve_operation_name(trace: &Context, matching: &MatchingContext) -> Option<String> {
    let state = trace.get::<AutomaticName>()?;
    let span = span_from(trace)?;

    let current = span.operation_name();
    if !state.owns(&current) {
        tracing::debug!(operation = %current, "Operation name set manually, skipping automatic naming");
        return None;
    }

    let name = operation_name(matching.traversal_order());
    if name.is_empty() {
        return None;
    }

    span.set_operation_name(&name);
    span.take_sampling_decision();
    state.remember(name.clone());
    tracing::debug!(operation = %name, matches = matching.len(), "Operation name resolved");
    Some(name)
}

/// Mark the span in `trace` as failed, then resolve its name.
pub fn fail_and_resolve(
    trace: &Context,
    matching: &MatchingContext,
    error: &crate::Error,
) -> Option<String> {
    if let Some(span) = span_from(trace) {
        span.fail(&error.to_string());
    }
    resolve_operation_name(trace, matching)
}

/// Give an unrouted request the `unhandled` name, if automatic naming
/// still owns the span and nothing renamed it since it started.
pub fn name_unhandled(trace: &Context, default_name: &str, unhandled_name: &str) -> bool {
    let (Some(state), Some(span)) = (trace.get::<AutomaticName>(), span_from(trace)) else {
        return false;
    };

    let current = span.operation_name();
    if current != default_name || !state.owns(&current) {
        return false;
    }

    span.set_operation_name(unhandled_name);
    state.remember(unhandled_name);
    true
}
