//! Routing hook subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (with TraceContext extension)
//!     → route.rs (RouteService builds a RequestContext)
//!     → request_context.rs path_prefix(matcher)
//!         → matcher.rs (consume prefix, extract values)
//!         → accumulator.rs (PathMatch prepended to a derived context)
//!     → terminal action (complete / redirect / fail_with / on_complete)
//!         → naming::gate (operation name + sampling decision)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Matching is explicit: a route asks for each match, nothing is global
//! - Each successful match produces exactly one immutable record
//! - Failed matches leave no trace; the route rejects as usual

pub mod accumulator;
pub mod matcher;
pub mod request_context;
pub mod route;

pub use accumulator::{Extracted, MatchingContext, PathMatch};
pub use matcher::{
    HexIntNumber, IntNumber, Literal, Matched, Optional, PathMatcher, Remaining, Segment, Slash,
    Then,
};
pub use request_context::RequestContext;
pub use route::{Route, RouteResult, RouteService};
