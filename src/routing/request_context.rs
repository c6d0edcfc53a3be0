//! Per-request processing context.
//!
//! # Responsibilities
//! - Track the unmatched part of the request path
//! - Accumulate a `PathMatch` for every successful matcher application
//! - Carry the request's trace context to every terminal action
//! - Resolve the operation name right before a response is produced
//!
//! # Design Decisions
//! - Derived contexts are copies: they inherit the parent's matches and
//!   never write back, so sibling routes do not see each other's matches
//! - Terminal actions consume the context

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Request, Uri};
use axum::response::{IntoResponse, Redirect};
use opentelemetry::Context;

use crate::context::carrier::{ContextCarrier, TraceContext};
use crate::context::interceptor::TracedFuture;
use crate::error::Error;
use crate::naming::gate::{fail_and_resolve, resolve_operation_name};
use crate::routing::accumulator::{Extracted, MatchingContext, PathMatch};
use crate::routing::matcher::PathMatcher;
use crate::routing::route::RouteResult;

/// The request being routed plus everything routing learned about it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request: Arc<Parts>,
    body: Arc<Mutex<Option<Body>>>,
    unmatched_path: String,
    matching: MatchingContext,
    trace: Context,
}

impl RequestContext {
    pub fn new(request: Request<Body>, trace: Context) -> Self {
        let (parts, body) = request.into_parts();
        let unmatched_path = parts.uri.path().to_string();
        Self {
            request: Arc::new(parts),
            body: Arc::new(Mutex::new(Some(body))),
            unmatched_path,
            matching: MatchingContext::new(),
            trace,
        }
    }

    /// Build a context using the trace context placed in the request
    /// extensions, or the current one when there is none.
    pub fn from_request(request: Request<Body>) -> Self {
        let trace = request
            .extensions()
            .get::<TraceContext>()
            .map(|tc| tc.context().clone())
            .unwrap_or_else(Context::current);
        Self::new(request, trace)
    }

    pub fn method(&self) -> &Method {
        &self.request.method
    }

    pub fn uri(&self) -> &Uri {
        &self.request.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.request.headers
    }

    /// Take the request body; later calls (from any derived context) get `None`.
    pub fn take_body(&self) -> Option<Body> {
        self.body
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn unmatched_path(&self) -> &str {
        &self.unmatched_path
    }

    pub fn matching(&self) -> &MatchingContext {
        &self.matching
    }

    /// A derived context with a different unmatched path.
    pub fn with_unmatched_path(&self, path: impl Into<String>) -> Self {
        let mut matching = MatchingContext::new();
        matching.replace(self.matching.snapshot());
        Self {
            request: Arc::clone(&self.request),
            body: Arc::clone(&self.body),
            unmatched_path: path.into(),
            matching,
            trace: self.trace.clone(),
        }
    }

    /// Apply `matcher` to the unmatched path.
    ///
    /// On success returns the extracted values and a derived context whose
    /// unmatched path is what the matcher left, with the match recorded.
    pub fn path_prefix<M>(&self, matcher: &M) -> Option<(Vec<Extracted>, RequestContext)>
    where
        M: PathMatcher + ?Sized,
    {
        let full_path = self.unmatched_path.as_str();
        let matched = matcher.apply(full_path)?;

        let record = PathMatch::from_remaining(full_path, matched.remaining, matched.extracted.clone());
        tracing::trace!(
            path = %full_path,
            consumed = record.consumed_len(),
            values = matched.extracted.len(),
            "Path matched"
        );

        let mut derived = self.with_unmatched_path(matched.remaining);
        derived.matching.prepend(record);
        Some((matched.extracted, derived))
    }

    /// True when the whole path has been consumed (a trailing `/` counts).
    pub fn path_end(&self) -> bool {
        self.unmatched_path.is_empty() || self.unmatched_path == "/"
    }

    /// Resolve the operation name from the matches so far.
    pub fn resolve_operation_name(&self) -> Option<String> {
        resolve_operation_name(&self.trace, &self.matching)
    }

    pub fn complete(self, response: impl IntoResponse) -> RouteResult {
        self.resolve_operation_name();
        RouteResult::Complete(response.into_response())
    }

    pub fn redirect(self, redirect: Redirect) -> RouteResult {
        self.resolve_operation_name();
        RouteResult::Complete(redirect.into_response())
    }

    /// Fail the request: the span is marked failed and named, and the error
    /// flows on to the normal error response.
    pub fn fail_with(self, error: Error) -> RouteResult {
        fail_and_resolve(&self.trace, &self.matching, &error);
        RouteResult::Failed(error)
    }

    /// Give up on this branch without producing a response.
    pub fn reject(self) -> RouteResult {
        RouteResult::Rejected
    }

    /// Wait for `future`, then continue with its result.
    ///
    /// The operation name is resolved before `f` runs, and `f` runs with
    /// the request's trace context attached while it is polled.
    pub async fn on_complete<T, F, Fut>(self, future: TracedFuture<T>, f: F) -> RouteResult
    where
        T: Send + 'static,
        F: FnOnce(RequestContext, Result<T, Error>) -> Fut,
        Fut: Future<Output = RouteResult>,
    {
        let result = future.await;
        self.resolve_operation_name();
        let trace = self.trace.clone();
        opentelemetry::context::FutureExt::with_context(f(self, result), trace).await
    }

    /// Like [`on_complete`](Self::on_complete), failing the request on error.
    pub async fn on_success<T, F, Fut>(self, future: TracedFuture<T>, f: F) -> RouteResult
    where
        T: Send + 'static,
        F: FnOnce(RequestContext, T) -> Fut,
        Fut: Future<Output = RouteResult>,
    {
        self.on_complete(future, |ctx, result| async move {
            match result {
                Ok(value) => f(ctx, value).await,
                Err(e) => ctx.fail_with(e),
            }
        })
        .await
    }
}

impl ContextCarrier for RequestContext {
    fn context(&self) -> &Context {
        &self.trace
    }
}
