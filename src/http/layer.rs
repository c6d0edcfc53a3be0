//! Per-request instrumentation middleware.
//!
//! # Responsibilities
//! - Start one span per request, tagged with the bind endpoint and protocol
//! - Build the request's trace context and make it reachable both
//!   explicitly (request extensions) and implicitly (attached while polling)
//! - Finish the span and record metrics when the response is ready
//!
//! # Design Decisions
//! - The endpoint is fixed when the layer is built, one layer per listener
//! - Automatic naming is switched on by seeding `AutomaticName`
//! - The span is finished even when the response future is dropped

use std::fmt;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use axum::http::{Request, Response, StatusCode};
use futures_util::future::BoxFuture;
use opentelemetry::context::FutureExt;
use opentelemetry::Context;
use tower::{Layer, Service};

use crate::config::NamingConfig;
use crate::context::carrier::TraceContext;
use crate::naming::gate::{name_unhandled, AutomaticName};
use crate::net::endpoint::{Endpoint, Protocol};
use crate::observability::metrics::{self, RequestLabels};
use crate::observability::span::{ActiveSpan, DeferredSpan, RequestSpan};
use crate::observability::tracer::Tracer;

/// Header set by the request-id layer.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Tower layer that instruments every request served on one endpoint.
#[derive(Debug, Clone)]
pub struct InstrumentationLayer {
    tracer: Arc<Tracer>,
    endpoint: Endpoint,
}

impl InstrumentationLayer {
    pub fn new(tracer: Arc<Tracer>, endpoint: Endpoint) -> Self {
        Self { tracer, endpoint }
    }
}

impl<S> Layer<S> for InstrumentationLayer {
    type Service = InstrumentationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentationService {
            inner,
            tracer: Arc::clone(&self.tracer),
            endpoint: self.endpoint.clone(),
        }
    }
}

/// Service produced by [`InstrumentationLayer`].
#[derive(Debug, Clone)]
pub struct InstrumentationService<S> {
    inner: S,
    tracer: Arc<Tracer>,
    endpoint: Endpoint,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for InstrumentationService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let protocol = Protocol::from_version(request.version());
        let naming = self.tracer.naming();
        let span = self.tracer.start_span();
        tag_request(span.as_ref(), &request, &self.endpoint, protocol);

        let mut trace = Context::current().with_value(ActiveSpan::new(span.clone()));
        if naming.automatic {
            trace = trace.with_value(AutomaticName::new(span.operation_name()));
        }
        request
            .extensions_mut()
            .insert(TraceContext::new(trace.clone()));

        let guard = InFlight::start(span, self.endpoint.clone());
        let labels = RequestLabels {
            endpoint: self.endpoint.clone(),
            protocol,
            method: request.method().to_string(),
            operation: String::new(),
        };

        // The inner service may do work synchronously in `call`.
        let response = {
            let _attached = trace.clone().attach();
            self.inner.call(request)
        };

        let response_trace = trace.clone();
        let completed = async move {
            let result = response.await;
            let status = match &result {
                Ok(response) => {
                    on_response(&response_trace, &guard.span, &naming, response.status());
                    response.status()
                }
                Err(e) => {
                    guard.span.fail(&e.to_string());
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            guard.span.finish();
            let labels = RequestLabels {
                operation: guard.span.operation_name(),
                ..labels
            };
            metrics::record_request(&labels, status.as_u16(), start);
            result
        };

        Box::pin(completed.with_context(trace))
    }
}

fn tag_request<B>(span: &DeferredSpan, request: &Request<B>, endpoint: &Endpoint, protocol: Protocol) {
    span.tag("span.kind", "server");
    span.tag("component", "route-tracer");
    span.tag("http.method", request.method().as_str());
    span.tag("http.url", &request.uri().to_string());
    span.tag("server.interface", endpoint.interface());
    span.tag("server.port", &endpoint.port().to_string());
    span.tag("net.protocol", protocol.as_str());
    if let Some(id) = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
    {
        span.tag("http.request_id", id);
    }
}

fn on_response(trace: &Context, span: &DeferredSpan, naming: &NamingConfig, status: StatusCode) {
    span.tag("http.status_code", status.as_str());
    if status.is_server_error() {
        span.fail(&format!("HTTP {}", status.as_u16()));
    }
    if status == StatusCode::NOT_FOUND
        && name_unhandled(
            trace,
            &naming.default_operation_name,
            &naming.unhandled_operation_name,
        )
    {
        tracing::debug!(uri = ?span.tag_value("http.url"), "Request not handled by any route");
    }
}

/// Tracks an in-flight request; finishing the span and releasing the
/// gauge happen on drop, so cancelled requests are accounted for too.
struct InFlight {
    span: Arc<DeferredSpan>,
    endpoint: Endpoint,
}

impl InFlight {
    fn start(span: Arc<DeferredSpan>, endpoint: Endpoint) -> Self {
        metrics::increment_active_requests(&endpoint);
        Self { span, endpoint }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.span.finish();
        metrics::decrement_active_requests(&self.endpoint);
    }
}
