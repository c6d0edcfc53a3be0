//! Causal context carried by asynchronous values.
//!
//! Anything that can hand out a [`Context`] is a [`ContextCarrier`]; the
//! carrier decides *which* context a continuation sees, and
//! [`ContextCarrier::run_in_context`] makes it current for exactly the
//! duration of that continuation.

use std::future::Future;

use opentelemetry::context::{FutureExt, WithContext};
use opentelemetry::Context;

/// A value with an attached causal context.
pub trait ContextCarrier {
    /// The context attached to this value.
    fn context(&self) -> &Context;

    /// Run `f` with this value's context attached, restoring the previous
    /// context afterwards, also when `f` unwinds.
    fn run_in_context<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.context().clone().attach();
        f()
    }
}

/// A resolved value together with the context it was produced in.
#[derive(Debug, Clone)]
pub struct Contextual<T> {
    value: T,
    context: Context,
}

impl<T> Contextual<T> {
    pub fn new(value: T, context: Context) -> Self {
        Self { value, context }
    }

    /// Attach the currently active context.
    pub fn capture(value: T) -> Self {
        Self::new(value, Context::current())
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, Context) {
        (self.value, self.context)
    }
}

impl ContextCarrier for Context {
    fn context(&self) -> &Context {
        self
    }
}

impl<T> ContextCarrier for Contextual<T> {
    fn context(&self) -> &Context {
        &self.context
    }
}

/// Trace context stored in request extensions, so handlers further down
/// the stack can pick it up explicitly instead of relying on the
/// thread-local current context.
#[derive(Debug, Clone)]
pub struct TraceContext(Context);

impl TraceContext {
    pub fn new(context: Context) -> Self {
        Self(context)
    }

    pub fn into_inner(self) -> Context {
        self.0
    }
}

impl ContextCarrier for TraceContext {
    fn context(&self) -> &Context {
        &self.0
    }
}

/// Bind `future` to the context that is current right now.
///
/// Every poll of the returned future runs with that context attached,
/// whichever worker thread polls it.
pub fn carry<F: Future>(future: F) -> WithContext<F> {
    future.with_current_context()
}
