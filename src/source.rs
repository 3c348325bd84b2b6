//! The I/O source: a bridge from parallel workers to cooperative turns.
//!
//! Work submitted to a source runs on its own OS thread, outside the
//! cooperative turn model, but its *completion* is delivered as an ordinary
//! turn: the worker appends a pre-allocated completion turn to the source's
//! mutex-guarded list and pulses the source's event. The manager observes
//! the pulse at its next idle wait or cycle scan and splices the list into
//! its queue, so the continuation of an I/O computation always runs on the
//! actor thread.
//!
//! The completion list is the only cross-thread mutable state in the
//! runtime, and its mutex is held only for the duration of a list splice.

use crate::error::Error;
use crate::event::Event;
use crate::manager::Manager;
use crate::promise::Promise;
use crate::resolver::Cell;
use crate::runner::Runner;
use crate::tracing_compat::{info, trace};
use crate::turn::{Turn, TurnList};
use core::fmt;
use std::mem;
use std::sync::{Arc, Mutex};
use std::thread;

/// The completion list shared between a source's workers and its manager.
pub(crate) struct SourceQueue {
    /// Diagnostic string identifying the source.
    name: String,

    /// Completion turns ready to run on the manager.
    list: Mutex<TurnList>,
}

impl SourceQueue {
    pub(crate) fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            list: Mutex::new(TurnList::new()),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn push(&self, turn: Arc<Turn>) {
        self.list.lock().expect("source list poisoned").append(turn);
    }

    /// Atomically takes every completion turn that is ready to run.
    pub(crate) fn take_all(&self) -> TurnList {
        mem::take(&mut *self.list.lock().expect("source list poisoned"))
    }
}

/// A source of truly parallel computations whose completions run as turns.
///
/// # Closing
///
/// [`close`](Source::close) unregisters the source from its manager. Any
/// outstanding computation at that point never delivers its completion and
/// its promise is orphaned; drain pending work before closing.
pub struct Source {
    manager: Manager,
    queue: Arc<SourceQueue>,
    event: Event<Arc<SourceQueue>>,
}

impl Source {
    /// Creates a new source registered with the runner's manager.
    #[must_use]
    pub fn new(runner: &Runner) -> Self {
        let manager = runner.manager().clone();
        let queue = SourceQueue::new(format!("Source{}", manager.next_id()));
        info!(source = %queue.name(), "registering i/o source");
        let event = manager.register_source(Arc::clone(&queue));
        Self {
            manager,
            queue,
            event,
        }
    }

    /// Starts `f` on a parallel worker thread and returns a promise for its
    /// completion.
    ///
    /// The promise resolves on the actor thread with whatever `f` returned.
    pub fn spawn<F>(&self, f: F) -> Promise<()>
    where
        F: FnOnce() -> Result<(), Error> + Send + 'static,
    {
        // The resolver and the completion turn are allocated here, on the
        // manager's thread: id generation is a manager-side operation, and
        // pre-allocating leaves the worker nothing to do but run and
        // deliver.
        let cell: Arc<Cell<()>> = Cell::new(self.manager.clone());
        let promise = Promise::from_cell(Arc::clone(&cell));

        let outcome: Arc<Mutex<Option<Result<(), Error>>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&outcome);
        let turn = Turn::new(format!("IOResult{}", self.manager.next_id()), move || {
            let outcome = slot
                .lock()
                .expect("completion slot poisoned")
                .take()
                .expect("a completion turn only runs after its worker finished");
            cell.resolve(outcome);
        });

        let queue = Arc::clone(&self.queue);
        let event = self.event.clone();
        thread::spawn(move || {
            // Truly parallel: run the computation off the actor thread,
            // then atomically marshal the completion back to the source.
            let result = f();
            trace!(source = %queue.name(), ok = result.is_ok(), "i/o complete");
            *outcome.lock().expect("completion slot poisoned") = Some(result);
            queue.push(turn);
            event.signal();
        });

        promise
    }

    /// Closes the source, unregistering it from the manager.
    ///
    /// Closing with outstanding work orphans those completions; the caller
    /// is responsible for draining first.
    pub fn close(&self) {
        info!(source = %self.queue.name(), "closing i/o source");
        self.event.close();
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.queue.name())
            .field("closed", &self.event.is_closed())
            .finish()
    }
}
