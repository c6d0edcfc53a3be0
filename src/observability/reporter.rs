//! Finished-span sinks.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Snapshot of a finished, sampled span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanRecord {
    pub trace_id: String,
    pub span_id: String,
    pub operation_name: String,
    pub tags: BTreeMap<String, String>,
    pub failure: Option<String>,
    pub duration_micros: u64,
}

impl SpanRecord {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Receives spans once they finish and were sampled.
pub trait SpanReporter: Send + Sync + fmt::Debug {
    fn report(&self, span: SpanRecord);
}

/// Emits finished spans as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl SpanReporter for LogReporter {
    fn report(&self, span: SpanRecord) {
        let encoded = serde_json::to_string(&span).unwrap_or_default();
        tracing::info!(
            target: "route_tracer::spans",
            trace_id = %span.trace_id,
            operation = %span.operation_name,
            duration_us = span.duration_micros,
            failed = span.failure.is_some(),
            span = %encoded,
            "Span finished"
        );
    }
}

/// Keeps finished spans in memory, mostly for tests and debugging.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReporter {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl SpanReporter for InMemoryReporter {
    fn report(&self, span: SpanRecord) {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span);
    }
}
