//! Routes and their tower adapter.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use tower::Service;

use crate::error::Error;
use crate::routing::request_context::RequestContext;

/// Outcome of running a route against a request.
#[derive(Debug)]
pub enum RouteResult {
    Complete(Response),
    Rejected,
    Failed(Error),
}

impl IntoResponse for RouteResult {
    fn into_response(self) -> Response {
        match self {
            RouteResult::Complete(response) => response,
            RouteResult::Rejected => (StatusCode::NOT_FOUND, "No matching route").into_response(),
            RouteResult::Failed(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        }
    }
}

/// A request handler driven by a `RequestContext`.
pub trait Route: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, RouteResult>;
}

impl<F, Fut> Route for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult> + Send + 'static,
{
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, RouteResult> {
        Box::pin(self(ctx))
    }
}

/// Serves a [`Route`] as a tower service.
pub struct RouteService<R> {
    route: Arc<R>,
}

impl<R> RouteService<R> {
    pub fn new(route: R) -> Self {
        Self {
            route: Arc::new(route),
        }
    }

    pub fn from_arc(route: Arc<R>) -> Self {
        Self { route }
    }
}

impl<R> Clone for RouteService<R> {
    fn clone(&self) -> Self {
        Self {
            route: Arc::clone(&self.route),
        }
    }
}

impl<R: Route> Service<Request<Body>> for RouteService<R> {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let ctx = RequestContext::from_request(request);
        let routed = self.route.call(ctx);
        Box::pin(async move {
            let result = routed.await;
            if let RouteResult::Failed(ref e) = result {
                tracing::warn!(error = %e, "Route failed");
            }
            Ok(result.into_response())
        })
    }
}
