//! Crate-wide error type.

/// Errors surfaced by the instrumentation layer.
///
/// Naming and context propagation never produce errors of their own; the
/// variants below describe failures that flow *through* the layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A user continuation panicked while running inside a scoped context.
    #[error("continuation panicked: {0}")]
    ContinuationPanicked(String),

    /// The request was explicitly failed by the route (`fail_with`).
    #[error("request failed: {0}")]
    Request(String),

    /// A traced future was polled again after yielding its result.
    #[error("traced future already consumed")]
    FutureConsumed,
}

impl Error {
    /// Shorthand for a route-level failure.
    pub fn request(message: impl Into<String>) -> Self {
        Error::Request(message.into())
    }
}
