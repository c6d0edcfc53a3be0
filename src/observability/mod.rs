//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http::layer starts a request
//!     → tracer.rs (DeferredSpan with the default operation name)
//!     → span.rs (span stored in the trace context)
//!     → naming::gate renames it and takes the sampling decision
//!     → sampler.rs (decision based on the final name)
//!     → reporter.rs (sampled spans, on finish)
//!     → metrics.rs (counters/histograms labelled by operation)
//!     → logging.rs (structured log events)
//! ```
//!
//! # Design Decisions
//! - Span storage/export is a pluggable `SpanReporter`
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod reporter;
pub mod sampler;
pub mod span;
pub mod tracer;

pub use reporter::{InMemoryReporter, LogReporter, SpanRecord, SpanReporter};
pub use sampler::{Sampler, SamplingDecision};
pub use span::{current_span, span_from, ActiveSpan, DeferredSpan, RequestSpan};
pub use tracer::Tracer;
