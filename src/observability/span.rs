//! Request spans and how they travel inside the trace context.
//!
//! # Responsibilities
//! - Define the operations the naming layer needs from a span
//! - Store the active span in an `opentelemetry::Context`
//! - Provide a deferred-sampling span implementation
//!
//! # Design Decisions
//! - The sampling decision is taken at most once, first caller wins
//! - A span finished without a decision takes one on the way out
//! - Only sampled spans reach the reporter

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use opentelemetry::Context;
use uuid::Uuid;

use crate::observability::reporter::{SpanRecord, SpanReporter};
use crate::observability::sampler::{Sampler, SamplingDecision};

/// Operations the instrumentation performs on the tracing backend's span.
pub trait RequestSpan: Send + Sync + fmt::Debug {
    /// Current operation name.
    fn operation_name(&self) -> String;

    fn set_operation_name(&self, name: &str);

    /// Commit the sampling decision, returning the (possibly earlier) result.
    fn take_sampling_decision(&self) -> SamplingDecision;

    /// The decision, if one was already taken.
    fn sampling_decision(&self) -> Option<SamplingDecision>;

    fn fail(&self, message: &str);

    fn tag(&self, key: &str, value: &str);

    fn finish(&self);
}

/// Context entry holding the span of the request being processed.
#[derive(Clone, Debug)]
pub struct ActiveSpan(Arc<dyn RequestSpan>);

impl ActiveSpan {
    pub fn new(span: Arc<dyn RequestSpan>) -> Self {
        Self(span)
    }

    pub fn span(&self) -> &Arc<dyn RequestSpan> {
        &self.0
    }
}

/// The span stored in `cx`, if any.
pub fn span_from(cx: &Context) -> Option<Arc<dyn RequestSpan>> {
    cx.get::<ActiveSpan>().map(|active| Arc::clone(active.span()))
}

/// The span stored in the currently attached context, if any.
pub fn current_span() -> Option<Arc<dyn RequestSpan>> {
    Context::map_current(span_from)
}

/// A span whose sampling decision waits until its name is final.
#[derive(Debug)]
pub struct DeferredSpan {
    trace_id: Uuid,
    span_id: u64,
    name: ArcSwap<String>,
    tags: DashMap<String, String>,
    failure: OnceLock<String>,
    decision: OnceLock<SamplingDecision>,
    finished: AtomicBool,
    started: Instant,
    sampler: Arc<Sampler>,
    reporter: Arc<dyn SpanReporter>,
}

impl DeferredSpan {
    pub fn new(name: &str, sampler: Arc<Sampler>, reporter: Arc<dyn SpanReporter>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            span_id: fastrand::u64(..),
            name: ArcSwap::from_pointee(name.to_string()),
            tags: DashMap::new(),
            failure: OnceLock::new(),
            decision: OnceLock::new(),
            finished: AtomicBool::new(false),
            started: Instant::now(),
            sampler,
            reporter,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.get().map(String::as_str)
    }

    pub fn tag_value(&self, key: &str) -> Option<String> {
        self.tags.get(key).map(|v| v.value().clone())
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn to_record(&self) -> SpanRecord {
        let tags: BTreeMap<String, String> = self
            .tags
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        SpanRecord {
            trace_id: self.trace_id.simple().to_string(),
            span_id: format!("{:016x}", self.span_id),
            operation_name: self.operation_name(),
            tags,
            failure: self.failure.get().cloned(),
            duration_micros: u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX),
        }
    }
}

impl RequestSpan for DeferredSpan {
    fn operation_name(&self) -> String {
        self.name.load().as_ref().clone()
    }

    fn set_operation_name(&self, name: &str) {
        self.name.store(Arc::new(name.to_string()));
    }

    fn take_sampling_decision(&self) -> SamplingDecision {
        *self.decision.get_or_init(|| {
            let name = self.operation_name();
            let decision = self.sampler.decide(&name);
            tracing::debug!(
                trace_id = %self.trace_id.simple(),
                operation = %name,
                ?decision,
                "Sampling decision taken"
            );
            decision
        })
    }

    fn sampling_decision(&self) -> Option<SamplingDecision> {
        self.decision.get().copied()
    }

    fn fail(&self, message: &str) {
        let _ = self.failure.set(message.to_string());
        self.tags.insert("error".to_string(), "true".to_string());
    }

    fn tag(&self, key: &str, value: &str) {
        self.tags.insert(key.to_string(), value.to_string());
    }

    fn finish(&self) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.take_sampling_decision().is_sampled() {
            self.reporter.report(self.to_record());
        }
    }
}
