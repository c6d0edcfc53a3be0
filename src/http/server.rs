//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the per-listener service stack around the user route
//! - Serve HTTP/1.1 and HTTP/2 on the same port
//! - Accept connections on the bounded listener until shutdown
//!
//! # Data Flow
//! ```text
//! Listener::accept (permit held per connection)
//!     → hyper-util auto builder (HTTP/1 or HTTP/2)
//!     → SetRequestId → PropagateRequestId
//!     → InstrumentationLayer (span + trace context)
//!     → Timeout
//!     → RouteService (user route, automatic naming)
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use tower::util::BoxCloneService;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

use crate::config::TracerConfig;
use crate::http::layer::InstrumentationLayer;
use crate::net::endpoint::Endpoint;
use crate::net::listener::{Listener, ListenerError};
use crate::observability::tracer::Tracer;
use crate::routing::route::{Route, RouteService};

/// The fully layered service for one endpoint.
pub type TracedService = BoxCloneService<Request<Body>, Response, Infallible>;

/// HTTP server instrumenting a single route tree.
pub struct HttpServer<R> {
    tracer: Arc<Tracer>,
    route: Arc<R>,
    request_timeout: Duration,
}

impl<R: Route> HttpServer<R> {
    pub fn new(config: &TracerConfig, tracer: Arc<Tracer>, route: R) -> Self {
        Self {
            tracer,
            route: Arc::new(route),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        }
    }

    /// Build the service stack for requests arriving on `endpoint`.
    #[allow(deprecated)]
    pub fn service(&self, endpoint: Endpoint) -> TracedService {
        let stack = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(InstrumentationLayer::new(Arc::clone(&self.tracer), endpoint))
            .layer(TimeoutLayer::new(self.request_timeout))
            .service(RouteService::from_arc(Arc::clone(&self.route)));
        BoxCloneService::new(stack)
    }

    /// Run the server, accepting connections on `listener` until
    /// `shutdown` completes. In-flight connections are left to finish.
    pub async fn run(self, listener: Listener, shutdown: impl Future<Output = ()>) {
        let endpoint = listener.endpoint().clone();
        let service = self.service(endpoint.clone());

        tracing::info!(
            interface = %endpoint.interface(),
            port = endpoint.port(),
            request_timeout_secs = self.request_timeout.as_secs(),
            "HTTP server starting"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer_addr, permit) = match accepted {
                        Ok(connection) => connection,
                        Err(ListenerError::Closed) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let service = service
                        .clone()
                        .map_request(|request: Request<Incoming>| request.map(Body::new));
                    tokio::spawn(async move {
                        let _permit = permit;
                        let connection = auto::Builder::new(TokioExecutor::new())
                            .serve_connection(TokioIo::new(stream), TowerToHyperService::new(service))
                            .await;
                        if let Err(e) = connection {
                            tracing::debug!(peer_addr = %peer_addr, error = %e, "Connection closed with error");
                        }
                    });
                }
            }
        }

        tracing::info!("HTTP server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::reporter::InMemoryReporter;
    use crate::routing::{Literal, RequestContext, RouteResult};
    use axum::http::StatusCode;

    async fn ping(ctx: RequestContext) -> RouteResult {
        match ctx.path_prefix(&Literal::new("/ping")) {
            Some((_, ctx)) if ctx.path_end() => ctx.complete("pong"),
            _ => ctx.reject(),
        }
    }

    #[tokio::test]
    async fn stack_sets_and_propagates_request_id() {
        let config = TracerConfig::default();
        let reporter = InMemoryReporter::new();
        let tracer = Arc::new(Tracer::new(&config, Arc::new(reporter.clone())));
        let server = HttpServer::new(&config, tracer, ping);

        let response = server
            .service(Endpoint::new("0.0.0.0", 8080))
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
        let span = &reporter.spans()[0];
        assert_eq!(span.operation_name, "/ping");
        assert_eq!(span.tag("http.request_id"), Some(id));
    }
}
