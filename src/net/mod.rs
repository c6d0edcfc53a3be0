//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → endpoint.rs ({interface, port} captured at bind time)
//!     → Hand off to HTTP layer together with the endpoint
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Endpoint metadata is fixed per listener and carried, not looked up

pub mod endpoint;
pub mod listener;

pub use endpoint::{Endpoint, Protocol};
pub use listener::{ConnectionPermit, Listener, ListenerError};
