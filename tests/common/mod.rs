//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;

use route_tracer::config::TracerConfig;
use route_tracer::context::TracedFuture;
use route_tracer::net::Listener;
use route_tracer::observability::{current_span, InMemoryReporter, RequestSpan, SpanRecord, Tracer};
use route_tracer::routing::{
    HexIntNumber, IntNumber, Literal, PathMatcher, Remaining, RequestContext, Route, RouteResult,
    Segment, Slash,
};
use route_tracer::{Error, HttpServer};

/// A running server plus the spans it reported.
pub struct TestServer {
    pub addr: SocketAddr,
    pub reporter: InMemoryReporter,
    pub tracer: Arc<Tracer>,
    shutdown: Option<oneshot::Sender<()>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        self.reporter.spans()
    }

    /// The single span reported so far.
    pub fn only_span(&self) -> SpanRecord {
        let mut spans = self.spans();
        assert_eq!(spans.len(), 1, "expected exactly one span, got {spans:?}");
        spans.remove(0)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Start a server on an ephemeral local port.
pub async fn start_server<R: Route>(mut config: TracerConfig, route: R) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".into();
    let reporter = InMemoryReporter::new();
    let tracer = Arc::new(Tracer::new(&config, Arc::new(reporter.clone())));

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = SocketAddr::from(([127, 0, 0, 1], listener.endpoint().port()));

    let (tx, rx) = oneshot::channel::<()>();
    let server = HttpServer::new(&config, Arc::clone(&tracer), route);
    tokio::spawn(async move {
        server
            .run(listener, async {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        addr,
        reporter,
        tracer,
        shutdown: Some(tx),
    }
}

/// HTTP/1.1 client without connection reuse or redirects.
#[allow(dead_code)]
pub fn http1_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// HTTP/2 client using prior knowledge (h2c).
#[allow(dead_code)]
pub fn http2_client() -> reqwest::Client {
    reqwest::Client::builder()
        .http2_prior_knowledge()
        .no_proxy()
        .build()
        .unwrap()
}

/// Route table used by most integration tests.
pub async fn test_routes(ctx: RequestContext) -> RouteResult {
    if let Some((_, api)) = ctx.path_prefix(&Literal::new("/api/v1/")) {
        if let Some((_, user)) =
            api.path_prefix(&Literal::new("users").then(Slash).then(IntNumber).then(Slash))
        {
            if let Some((_, orders)) = user.path_prefix(&Literal::new("orders")) {
                if orders.path_end() {
                    return orders.complete("orders");
                }
            }
        }
        if let Some((_, item)) = api.path_prefix(&Literal::new("items/").then(HexIntNumber)) {
            if item.path_end() {
                return item.complete("item");
            }
        }
        if let Some((_, custom)) = api.path_prefix(&Literal::new("custom")) {
            if let Some(span) = current_span() {
                span.set_operation_name("custom-operation");
            }
            return custom.complete("custom");
        }
        if let Some((_, slow)) = api.path_prefix(&Literal::new("slow/").then(IntNumber)) {
            let lookup = TracedFuture::new(async {
                tokio::task::yield_now().await;
                Ok::<_, Error>(())
            })
            .map(|_| current_span().map(|span| span.operation_name()));
            return slow
                .on_success(lookup, |ctx, seen| async move {
                    let during = current_span().map(|span| span.operation_name());
                    ctx.complete(format!("{seen:?} {during:?}"))
                })
                .await;
        }
        return api.reject();
    }

    if let Some((_, user)) = ctx.path_prefix(&Literal::new("/users/").then(Segment).then(Slash)) {
        if let Some((_, posts)) = user.path_prefix(&Literal::new("posts")) {
            return posts.complete("posts");
        }
    }

    if let Some((_, file)) = ctx.path_prefix(&Literal::new("/files/").then(Remaining)) {
        return file.complete("file");
    }

    if let Some((_, redirect)) = ctx.path_prefix(&Literal::new("/redirect")) {
        return redirect.redirect(axum::response::Redirect::temporary("/api/v1/users/1/orders"));
    }

    if let Some((_, fail)) = ctx.path_prefix(&Literal::new("/fail")) {
        return fail.fail_with(Error::request("injected"));
    }

    ctx.reject()
}
