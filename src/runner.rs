//! The runner: the public handle an actor uses to start computations.
//!
//! A runner is a thin facade over a manager. It allocates promise cells,
//! spawns new computations as turns, and hands out the shared pre-resolved
//! `done` promise that void computations return when they have nothing
//! further to do:
//!
//! ```ignore
//! let result = runner.spawn(|| {
//!     // do something
//!     runner.done()
//! });
//! ```

use crate::error::Error;
use crate::manager::Manager;
use crate::promise::{Promise, Resolver};
use crate::resolver::Cell;
use core::fmt;
use std::sync::Arc;

/// Starts asynchronous computations and allocates their results.
///
/// Cloning the handle shares the underlying manager and `done` constant.
#[derive(Clone)]
pub struct Runner {
    manager: Manager,

    /// Shared already-successful void promise returned by [`done`](Self::done).
    done: Promise<()>,
}

impl Runner {
    /// Creates a runner over `manager`.
    #[must_use]
    pub fn new(manager: &Manager) -> Self {
        Self {
            manager: manager.clone(),
            done: Promise::from_cell(Cell::resolved(manager.clone(), Ok(()))),
        }
    }

    /// Starts a new computation and returns its result.
    ///
    /// `f` runs as a turn on the manager; the returned promise resolves once
    /// the promise `f` returns does, transitively covering any further
    /// computations `f` chains onto it.
    pub fn spawn<F>(&self, f: F) -> Promise<()>
    where
        F: FnOnce() -> Promise<()> + Send + 'static,
    {
        let (promise, resolver) = self.new_result::<()>();
        let name = format!("New{}", self.manager.next_id());
        self.manager.new_turn(name, move || {
            let next = f();
            resolver.forward(&next);
        });
        promise
    }

    /// Allocates a new unresolved promise and its resolver.
    #[must_use]
    pub fn new_result<T>(&self) -> (Promise<T>, Resolver<T>) {
        let cell = Cell::new(self.manager.clone());
        (
            Promise::from_cell(Arc::clone(&cell)),
            Resolver::from_cell(cell),
        )
    }

    /// Returns an already-failed promise.
    ///
    /// See also [`new_error_fmt!`](crate::new_error_fmt) for the formatting
    /// variant.
    #[must_use]
    pub fn new_error<T>(&self, err: impl Into<Error>) -> Promise<T> {
        let (promise, resolver) = self.new_result::<T>();
        resolver.fail(err.into());
        promise
    }

    /// Returns the shared already-successful void promise.
    #[must_use]
    pub fn done(&self) -> Promise<()> {
        self.done.clone()
    }

    /// Returns the manager this runner schedules onto.
    #[must_use]
    pub fn manager(&self) -> &Manager {
        &self.manager
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner").finish_non_exhaustive()
    }
}

/// Returns an already-failed promise built from format arguments.
///
/// ```ignore
/// let r: Promise<()> = new_error_fmt!(runner, "lookup of {key} failed");
/// ```
#[macro_export]
macro_rules! new_error_fmt {
    ($runner:expr, $($arg:tt)*) => {
        $runner.new_error($crate::Error::new(format!($($arg)*)))
    };
}
