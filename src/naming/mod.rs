//! Operation naming subsystem.
//!
//! # Data Flow
//! ```text
//! routing::RequestContext (accumulated PathMatch records)
//!     → terminal action (complete / redirect / fail / on_complete)
//!     → gate.rs (is automatic naming still in charge?)
//!     → reducer.rs (records → "/users/{}/orders")
//!     → span renamed, sampling decision committed
//! ```
//!
//! # Design Decisions
//! - Reduction is a pure function and never fails
//! - Naming is best-effort: it never changes the response

pub mod gate;
pub mod reducer;

pub use gate::{fail_and_resolve, name_unhandled, resolve_operation_name, AutomaticName};
pub use reducer::{operation_name, PLACEHOLDER};
