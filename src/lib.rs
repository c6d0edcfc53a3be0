//! Route-derived operation naming for HTTP request tracing.

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod naming;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::TracerConfig;
pub use error::Error;
pub use http::HttpServer;
pub use observability::Tracer;
