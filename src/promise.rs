//! Typed read and write handles for promise cells, and the continuation
//! combinators.
//!
//! A [`Promise<T>`] is the read half of a cell: it can be observed, chained,
//! and forwarded to. A [`Resolver<T>`] is the write half: it completes the
//! cell exactly once. Any number of handles may share one cell; a
//! continuation turn keeps its target cell alive until it runs.
//!
//! # Continuations and error propagation
//!
//! Each combinator attaches a continuation turn to the promise and returns
//! a new promise for the continuation's own result. The combinators differ
//! in which part of the outcome the closure sees and in what its return
//! value means:
//!
//! | Combinator | Closure | Upstream failure |
//! |-----------|---------|------------------|
//! | [`map`](Promise::map) | `T -> U` | closure skipped, failure flows through |
//! | [`and_then`](Promise::and_then) | `T -> Promise<U>` | closure skipped, failure flows through |
//! | [`then`](Promise::then) | `Result<T> -> Result<U>` | closure always runs |
//! | [`or_else`](Promise::or_else) | `Error -> Promise<T>` | closure runs only on failure |
//! | [`finally`](Promise::finally) | `()` | closure always runs; outcome preserved |
//!
//! The skip rule of `map`/`and_then` is the ergonomic heart of the system:
//! a closure that does not ask for the error is never invoked on failure,
//! and the failure propagates to the returned promise unchanged. Handlers
//! therefore never start with an `if err != nil`-style preamble; recovery
//! points opt in explicitly with `then` or `or_else`.
//!
//! A closure that returns a `Promise` binds the returned promise by
//! forwarding, so completion of the chain tracks the innermost computation.

use crate::error::Error;
use crate::resolver::Cell;
use core::fmt;
use std::sync::Arc;

/// The read half of a promise cell, typed by the success value.
///
/// The void base type is `Promise<()>`.
pub struct Promise<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Promise<T> {
    pub(crate) fn from_cell(cell: Arc<Cell<T>>) -> Self {
        Self { cell }
    }

    pub(crate) fn cell(&self) -> &Arc<Cell<T>> {
        &self.cell
    }

    /// Returns true once the promise has resolved, following any forwarding
    /// chain to its end.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        Cell::tail(&self.cell).is_resolved_here()
    }
}

impl<T: Clone> Promise<T> {
    /// Returns a copy of the outcome if the promise has resolved.
    ///
    /// This is an instantaneous peek, not a wait; prefer the combinators for
    /// reacting to resolution.
    #[must_use]
    pub fn try_outcome(&self) -> Option<Result<T, Error>> {
        Cell::tail(&self.cell).outcome_if_resolved()
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Transforms the success value with `f`.
    ///
    /// If the upstream fails, `f` is not invoked and the returned promise
    /// fails with the same error.
    pub fn map<U, F>(&self, f: F) -> Promise<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Promise::from_cell(Cell::when(&self.cell, move |outcome, outer| match outcome {
            Ok(value) => outer.resolve(Ok(f(value))),
            Err(err) => outer.resolve(Err(err)),
        }))
    }

    /// Chains an asynchronous continuation onto the success value.
    ///
    /// The returned promise tracks the promise `f` returns. If the upstream
    /// fails, `f` is not invoked and the failure flows through.
    ///
    /// # Panics
    ///
    /// The continuation panics if `f` returns a promise belonging to a
    /// different manager; promise graphs never span actors.
    pub fn and_then<U, F>(&self, f: F) -> Promise<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Promise<U> + Send + 'static,
    {
        Promise::from_cell(Cell::when(&self.cell, move |outcome, outer| match outcome {
            Ok(value) => outer.forward(f(value).cell()),
            Err(err) => outer.resolve(Err(err)),
        }))
    }

    /// Observes the full outcome, success or failure.
    ///
    /// `f` always runs and decides the outcome of the returned promise; this
    /// is the opt-in point for error inspection.
    pub fn then<U, F>(&self, f: F) -> Promise<U>
    where
        U: Send + 'static,
        F: FnOnce(Result<T, Error>) -> Result<U, Error> + Send + 'static,
    {
        Promise::from_cell(Cell::when(&self.cell, move |outcome, outer| {
            outer.resolve(f(outcome));
        }))
    }

    /// Recovers from a failure with an asynchronous fallback.
    ///
    /// On success the value passes through untouched; on failure the
    /// returned promise tracks the promise `f` returns.
    pub fn or_else<F>(&self, f: F) -> Promise<T>
    where
        F: FnOnce(Error) -> Promise<T> + Send + 'static,
    {
        Promise::from_cell(Cell::when(&self.cell, move |outcome, outer| match outcome {
            Ok(value) => outer.resolve(Ok(value)),
            Err(err) => outer.forward(f(err).cell()),
        }))
    }

    /// Runs `f` once the promise settles, regardless of how.
    ///
    /// The returned promise resolves to the same outcome as this one.
    pub fn finally<F>(&self, f: F) -> Promise<T>
    where
        F: FnOnce() + Send + 'static,
    {
        let original = self.clone();
        Promise::from_cell(Cell::when(&self.cell, move |_outcome, outer| {
            f();
            outer.forward(original.cell());
        }))
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.cell.state_name())
            .finish()
    }
}

/// The write half of a promise cell.
///
/// A resolver completes its cell at most once, through exactly one of
/// [`complete`](Resolver::complete), [`fail`](Resolver::fail),
/// [`resolve`](Resolver::resolve) or [`forward`](Resolver::forward).
pub struct Resolver<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Resolver<T> {
    pub(crate) fn from_cell(cell: Arc<Cell<T>>) -> Self {
        Self { cell }
    }

    /// Completes the associated promise successfully with `value`.
    ///
    /// # Panics
    ///
    /// Panics if the promise is already resolved or forwarded.
    pub fn complete(&self, value: T) {
        self.cell.resolve(Ok(value));
    }

    /// Completes the associated promise with a failure.
    ///
    /// # Panics
    ///
    /// Panics if the promise is already resolved or forwarded.
    pub fn fail(&self, err: Error) {
        self.cell.resolve(Err(err));
    }

    /// Completes the associated promise with `outcome`.
    ///
    /// The tagged `Result` replaces the value-or-error pair of convention:
    /// a success carrying an error is unrepresentable.
    ///
    /// # Panics
    ///
    /// Panics if the promise is already resolved or forwarded.
    pub fn resolve(&self, outcome: Result<T, Error>) {
        self.cell.resolve(outcome);
    }

    /// Redirects the associated promise to resolve with `next`'s outcome
    /// once `next` resolves.
    ///
    /// # Panics
    ///
    /// Panics if the promise is already resolved or forwarded, or if `next`
    /// belongs to a different manager.
    pub fn forward(&self, next: &Promise<T>) {
        self.cell.forward(next.cell());
    }

    /// Returns a read handle for the same cell.
    #[must_use]
    pub fn promise(&self) -> Promise<T> {
        Promise::from_cell(Arc::clone(&self.cell))
    }
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("state", &self.cell.state_name())
            .finish()
    }
}
