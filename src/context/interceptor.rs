//! Context-preserving transformations of future results.
//!
//! # Responsibilities
//! - Run every user continuation (`map`, `and_then`, `transform`, ...)
//!   under the right causal context
//! - Restore the previous context once the continuation returns or panics
//! - Turn panicking continuations into failed results
//!
//! # Which context a continuation sees
//! - Pending, regular future: the context current when the continuation
//!   was registered (carried by `WithContext`)
//! - Pending, batchable future: the context attached to the resolved value
//! - Already resolved: the context attached to the resolved value,
//!   activated synchronously for the duration of the call

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{ready, Context as TaskContext, Poll};

use futures_util::future::BoxFuture;

use crate::context::carrier::{carry, ContextCarrier, Contextual};
use crate::error::Error;

type Outcome<T> = Contextual<Result<T, Error>>;

enum State<T> {
    Pending(BoxFuture<'static, Outcome<T>>),
    Resolved(Outcome<T>),
    Consumed,
}

/// A future whose result carries the context it was produced in.
pub struct TracedFuture<T> {
    state: State<T>,
    batchable: bool,
}

// The value is never pinned in place; only the boxed future is polled.
impl<T> Unpin for TracedFuture<T> {}

impl<T: Send + 'static> TracedFuture<T> {
    /// Wrap `future`, binding it to the context current at creation.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let pending = carry(async move { Contextual::capture(future.await) });
        Self::pending(pending, false)
    }

    /// Wrap a bulk-scheduled future that carries no creation context.
    ///
    /// Continuations run in the context attached to the resolved value,
    /// i.e. whatever context was current when the future completed.
    pub fn batchable<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Error>> + Send + 'static,
    {
        Self::pending(async move { Contextual::capture(future.await) }, true)
    }

    /// An already resolved success, tagged with the current context.
    pub fn successful(value: T) -> Self {
        Self::resolved(Contextual::capture(Ok(value)), false)
    }

    /// An already resolved failure, tagged with the current context.
    pub fn failed(error: Error) -> Self {
        Self::resolved(Contextual::capture(Err(error)), false)
    }

    fn pending<F>(future: F, batchable: bool) -> Self
    where
        F: Future<Output = Outcome<T>> + Send + 'static,
    {
        Self {
            state: State::Pending(Box::pin(future)),
            batchable,
        }
    }

    fn resolved(outcome: Outcome<T>, batchable: bool) -> Self {
        Self {
            state: State::Resolved(outcome),
            batchable,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, State::Resolved(_))
    }

    pub fn is_batchable(&self) -> bool {
        self.batchable
    }

    /// Transform the result with a synchronous continuation.
    pub fn transform<U, F>(self, f: F) -> TracedFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(Result<T, Error>) -> Result<U, Error> + Send + 'static,
    {
        let batchable = self.batchable;
        match self.state {
            State::Resolved(outcome) => TracedFuture::resolved(apply(outcome, f), batchable),
            State::Pending(pending) if batchable => {
                TracedFuture::pending(async move { apply(pending.await, f) }, true)
            }
            State::Pending(pending) => {
                let registered = async move {
                    let (result, _) = pending.await.into_parts();
                    apply(Contextual::capture(result), f)
                };
                TracedFuture::pending(carry(registered), false)
            }
            State::Consumed => TracedFuture::failed(Error::FutureConsumed),
        }
    }

    /// Transform the result with a continuation that returns another future.
    pub fn transform_with<U, F>(self, f: F) -> TracedFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(Result<T, Error>) -> TracedFuture<U> + Send + 'static,
    {
        let batchable = self.batchable;
        match self.state {
            State::Resolved(outcome) => chain(outcome, f),
            State::Pending(pending) if batchable => TracedFuture::pending(
                async move { chain(pending.await, f).resolve().await },
                true,
            ),
            State::Pending(pending) => {
                let registered = async move {
                    let (result, _) = pending.await.into_parts();
                    chain(Contextual::capture(result), f).resolve().await
                };
                TracedFuture::pending(carry(registered), false)
            }
            State::Consumed => TracedFuture::failed(Error::FutureConsumed),
        }
    }

    pub fn map<U, F>(self, f: F) -> TracedFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.transform(|result| result.map(f))
    }

    pub fn and_then<U, F>(self, f: F) -> TracedFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> TracedFuture<U> + Send + 'static,
    {
        self.transform_with(|result| match result {
            Ok(value) => f(value),
            Err(e) => TracedFuture::failed(e),
        })
    }

    pub fn recover<F>(self, f: F) -> TracedFuture<T>
    where
        F: FnOnce(Error) -> Result<T, Error> + Send + 'static,
    {
        self.transform(|result| result.or_else(f))
    }

    /// Observe the result without changing it.
    pub fn on_complete<F>(self, f: F) -> TracedFuture<T>
    where
        F: FnOnce(&Result<T, Error>) + Send + 'static,
    {
        self.transform(|result| {
            f(&result);
            result
        })
    }

    /// Wait for the result together with its context.
    pub async fn resolve(self) -> Contextual<Result<T, Error>> {
        match self.state {
            State::Pending(pending) => pending.await,
            State::Resolved(outcome) => outcome,
            State::Consumed => Contextual::capture(Err(Error::FutureConsumed)),
        }
    }
}

impl<T> Future for TracedFuture<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let State::Pending(pending) = &mut this.state {
            let outcome = ready!(pending.as_mut().poll(cx));
            this.state = State::Consumed;
            return Poll::Ready(outcome.into_inner());
        }
        match std::mem::replace(&mut this.state, State::Consumed) {
            State::Resolved(outcome) => Poll::Ready(outcome.into_inner()),
            _ => Poll::Ready(Err(Error::FutureConsumed)),
        }
    }
}

impl<T> fmt::Debug for TracedFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Pending(_) => "pending",
            State::Resolved(_) => "resolved",
            State::Consumed => "consumed",
        };
        f.debug_struct("TracedFuture")
            .field("state", &state)
            .field("batchable", &self.batchable)
            .finish()
    }
}

fn apply<T, U, F>(outcome: Outcome<T>, f: F) -> Outcome<U>
where
    F: FnOnce(Result<T, Error>) -> Result<U, Error>,
{
    let (result, cx) = outcome.into_parts();
    let output = scoped(&cx, move || f(result)).and_then(|inner| inner);
    Contextual::new(output, cx)
}

fn chain<T, U, F>(outcome: Outcome<T>, f: F) -> TracedFuture<U>
where
    U: Send + 'static,
    F: FnOnce(Result<T, Error>) -> TracedFuture<U>,
{
    let (result, cx) = outcome.into_parts();
    match scoped(&cx, move || f(result)) {
        Ok(next) => next,
        Err(e) => TracedFuture::resolved(Contextual::new(Err(e), cx), false),
    }
}

/// Run `f` in the carrier's context. A panic is caught while the context
/// is still attached, so it is restored before the error is returned.
fn scoped<C: ContextCarrier, R>(carrier: &C, f: impl FnOnce() -> R) -> Result<R, Error> {
    carrier
        .run_in_context(|| panic::catch_unwind(AssertUnwindSafe(f)))
        .map_err(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::warn!(error = %message, "Continuation panicked");
            Error::ContinuationPanicked(message)
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
