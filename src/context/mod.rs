//! Causal context propagation.
//!
//! # Data Flow
//! ```text
//! http::layer builds the request's trace Context
//!     → carrier.rs (TraceContext in request extensions, WithContext futures)
//!     → routing hands it to RequestContext
//!     → interceptor.rs (TracedFuture continuations restore it)
//! ```
//!
//! # Design Decisions
//! - The substrate is `opentelemetry::Context` and its guard-scoped stack
//! - Activation is always paired: attach → run → guard drop
//! - No threads or tasks are spawned here

pub mod carrier;
pub mod interceptor;

pub use carrier::{carry, ContextCarrier, Contextual, TraceContext};
pub use interceptor::TracedFuture;
