//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (from net::Listener, endpoint known)
//!     → server.rs (hyper-util auto builder, HTTP/1 or HTTP/2)
//!     → layer.rs (span, trace context, endpoint + protocol tags)
//!     → routing::RouteService (user route)
//!     → layer.rs (status tags, unhandled naming, finish, metrics)
//!     → Send to client
//! ```

pub mod layer;
pub mod server;

pub use layer::{InstrumentationLayer, InstrumentationService, X_REQUEST_ID};
pub use server::{HttpServer, TracedService};
