//! route-tracer
//!
//! Serves a small route table with automatic, route-derived operation
//! names on every request span.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::Listener ──▶ http::server ──▶ http::layer ──▶ routing
//!                                                          │               │
//!                                                          │     path matches accumulate
//!                                                          │               │
//!                                                          ▼               ▼
//!                                                  observability ◀── naming::gate
//!                                              (span, sampler, reporter)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::response::Redirect;
use clap::Parser;

use route_tracer::config::{load_config, TracerConfig};
use route_tracer::config::watcher::ConfigWatcher;
use route_tracer::context::TracedFuture;
use route_tracer::net::Listener;
use route_tracer::observability::{logging, metrics, LogReporter, Tracer};
use route_tracer::routing::{
    Extracted, HexIntNumber, IntNumber, Literal, PathMatcher, Remaining, RequestContext,
    RouteResult, Slash,
};
use route_tracer::{Error, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "route-tracer", version, about = "HTTP server with route-derived span names")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => TracerConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "route-tracer starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        automatic_naming = config.naming.automatic,
        sampling = ?config.sampling.strategy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let tracer = Arc::new(Tracer::new(&config, Arc::new(LogReporter)));

    // Keep the watcher alive for the lifetime of the process.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let watcher = watcher.run()?;
            let tracer = Arc::clone(&tracer);
            tokio::spawn(async move {
                while let Some(updated) = updates.recv().await {
                    tracer.reconfigure(&updated);
                }
            });
            Some(watcher)
        }
        None => None,
    };

    let listener = Listener::bind(&config.listener).await?;
    let server = HttpServer::new(&config, tracer, demo_routes);
    server.run(listener, shutdown_signal()).await;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn demo_routes(ctx: RequestContext) -> RouteResult {
    if let Some((_, api)) = ctx.path_prefix(&Literal::new("/api/v1/")) {
        if let Some((values, user)) =
            api.path_prefix(&Literal::new("users").then(Slash).then(IntNumber).then(Slash))
        {
            let user_id = values.first().and_then(Extracted::as_int).unwrap_or_default();
            if let Some((_, orders)) = user.path_prefix(&Literal::new("orders")) {
                if orders.path_end() {
                    let lookup = TracedFuture::new(async move {
                        Ok::<_, Error>(format!("orders of user {user_id}"))
                    });
                    return orders
                        .on_success(lookup, |ctx, body| async move { ctx.complete(body) })
                        .await;
                }
            }
        }
        if let Some((values, item)) = api.path_prefix(&Literal::new("items/").then(HexIntNumber)) {
            if item.path_end() {
                let id = values.first().and_then(Extracted::as_int).unwrap_or_default();
                return item.complete(format!("item {id:#x}"));
            }
        }
        return api.reject();
    }

    if let Some((values, file)) = ctx.path_prefix(&Literal::new("/files/").then(Remaining)) {
        let path = values.first().and_then(Extracted::as_str).unwrap_or_default().to_string();
        return file.complete(format!("file {path}"));
    }

    if let Some((_, redirect)) = ctx.path_prefix(&Literal::new("/redirect")) {
        if redirect.path_end() {
            return redirect.redirect(Redirect::temporary("/api/v1/users/1/orders"));
        }
    }

    if let Some((_, fail)) = ctx.path_prefix(&Literal::new("/fail")) {
        if fail.path_end() {
            return fail.fail_with(Error::request("demonstration failure"));
        }
    }

    ctx.reject()
}
