//! The manager: a FIFO queue of turns and the loop that drives it.
//!
//! One manager is the heart of one actor. It owns the main turn queue, the
//! event set of registered I/O sources, and the id generator for diagnostic
//! names. Everything except [`run_until`](Manager::run_until) is ordinary
//! queue bookkeeping; the loop itself maintains three commitments:
//!
//! 1. **FIFO with a cycle boundary.** Each cycle snapshots the queue and
//!    runs the snapshot to completion; turns enqueued while the snapshot
//!    runs belong to the next cycle. A turn that re-queues itself therefore
//!    cannot starve the I/O scan.
//! 2. **I/O interleaving.** Every cycle begins by draining all currently
//!    signaled sources, splicing their completion lists into the queue.
//! 3. **Efficient idling.** With no local work and an unresolved root, the
//!    loop blocks on the event set rather than spinning. A wake-up
//!    re-signals the fired event so the next cycle's non-blocking scan
//!    observes it and ingests its turns.
//!
//! The manager handle is cheaply cloneable and shared by every resolver and
//! source bound to it; the queue and event set are used under the actor
//! thread's single-thread discipline.

use crate::error::Error;
use crate::event::Event;
use crate::event_set::EventSet;
use crate::id::{UniqueId, UniqueIdGenerator};
use crate::promise::Promise;
use crate::source::SourceQueue;
use crate::tracing_compat::{debug, trace};
use crate::turn::{Turn, TurnList};
use core::fmt;
use std::mem;
use std::sync::{Arc, Mutex};

/// A queue of turns that can be executed one at a time or cycle by cycle.
///
/// Cloning the handle shares the underlying manager.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    /// The main FIFO queue of turns.
    queue: Mutex<TurnList>,

    /// The I/O sources from which asynchronous turns may arrive.
    sources: Mutex<EventSet<Arc<SourceQueue>>>,

    /// Generator for the ids baked into diagnostic turn names.
    ids: UniqueIdGenerator,
}

impl Manager {
    /// Creates a new manager with an empty queue and no sources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                queue: Mutex::new(TurnList::new()),
                sources: Mutex::new(EventSet::new()),
                ids: UniqueIdGenerator::new(),
            }),
        }
    }

    /// Returns a fresh id for diagnostic naming. Ids are never reused.
    pub fn next_id(&self) -> UniqueId {
        self.inner.ids.next_id()
    }

    /// Returns true if `other` is a handle to this same manager.
    #[must_use]
    pub fn is_same(&self, other: &Manager) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Appends an existing detached turn to the queue.
    ///
    /// # Panics
    ///
    /// Panics if the turn is already in a list.
    pub fn queue_turn(&self, turn: Arc<Turn>) {
        self.inner
            .queue
            .lock()
            .expect("turn queue poisoned")
            .append(turn);
    }

    /// Creates a turn that will call `f`, queues it, and returns it.
    pub fn new_turn(
        &self,
        name: impl Into<String>,
        f: impl FnOnce() + Send + 'static,
    ) -> Arc<Turn> {
        let turn = Turn::new(name, f);
        self.queue_turn(Arc::clone(&turn));
        turn
    }

    /// Removes a turn from anywhere in the queue; O(n).
    ///
    /// Unlinking a turn that is no longer queued is a no-op.
    pub fn unlink(&self, turn: &Arc<Turn>) {
        self.inner
            .queue
            .lock()
            .expect("turn queue poisoned")
            .unlink(turn);
    }

    /// Returns the number of turns currently queued.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().expect("turn queue poisoned").len()
    }

    /// Runs a single turn from the queue if one exists.
    ///
    /// Returns true if a turn was run.
    pub fn run_one_turn(&self) -> bool {
        let turn = {
            let mut queue = self.inner.queue.lock().expect("turn queue poisoned");
            if queue.is_empty() {
                None
            } else {
                Some(queue.remove_head())
            }
        };
        match turn {
            Some(turn) => {
                turn.run();
                true
            }
            None => false,
        }
    }

    /// Runs turns until `root` resolves, idling on the I/O sources whenever
    /// the queue is empty.
    ///
    /// Returns the root's outcome.
    ///
    /// # Panics
    ///
    /// Panics on live-lock: no runnable turns, no registered sources, and an
    /// unresolved root mean the program can never make progress again.
    pub fn run_until(&self, root: Promise<()>) -> Result<(), Error> {
        let exited: Arc<Mutex<Option<Result<(), Error>>>> = Arc::new(Mutex::new(None));

        // Park the root's outcome in a slot the loop below can poll. The
        // attachment itself runs as a turn so that continuation ids are
        // allocated in queue order.
        let slot = Arc::clone(&exited);
        self.new_turn("RunUntil", move || {
            let _ = root.then(move |outcome| {
                *slot.lock().expect("exit slot poisoned") = Some(outcome.clone());
                outcome
            });
        });

        loop {
            self.run_one_cycle();

            if self.has_exited(&exited) {
                break;
            }

            if self.is_idle() {
                // No local work to do: block on I/O.
                let fired = self
                    .inner
                    .sources
                    .lock()
                    .expect("sources lock poisoned")
                    .wait();
                assert!(
                    self.is_idle(),
                    "only block on i/o when there is no work to do"
                );
                assert!(
                    !self.has_exited(&exited),
                    "only block on i/o while the root result is unresolved"
                );
                let fired = fired.expect(
                    "live lock: no runnable turns, no i/o sources, and the root \
                     result is unresolved",
                );
                // Put the pulse back so the next cycle's non-blocking scan
                // sees this source again.
                fired.signal();
            }
        }

        let outcome = exited.lock().expect("exit slot poisoned").take();
        outcome.expect("the run loop exits only after the root resolved")
    }

    /// Runs one iteration of the turn loop: ingest signaled sources, then
    /// execute a snapshot of the queue.
    fn run_one_cycle(&self) {
        // Fold completed I/O into the queue before snapshotting.
        loop {
            let fired = self
                .inner
                .sources
                .lock()
                .expect("sources lock poisoned")
                .select();
            let Some(event) = fired else { break };

            let mut completions = event.data().take_all();
            trace!(source = %event.data().name(), turns = completions.len(), "ingest");
            let mut queue = self.inner.queue.lock().expect("turn queue poisoned");
            while !completions.is_empty() {
                queue.append(completions.remove_head());
            }
        }

        // Snapshot the queue. Executing the snapshot may enqueue more turns,
        // but those run in the next cycle.
        let mut snapshot = mem::take(&mut *self.inner.queue.lock().expect("turn queue poisoned"));
        let mut ran = 0usize;
        while !snapshot.is_empty() {
            snapshot.remove_head().run();
            ran += 1;
        }
        if ran > 0 {
            debug!(turns = ran, "cycle complete");
        }
    }

    /// Registers a source of asynchronous turns and returns the event it
    /// should signal when completions are available. Closing the event
    /// unregisters the source.
    ///
    /// The manager allocates the event so the datum is always the type its
    /// drain loop consumes.
    pub(crate) fn register_source(&self, source: Arc<SourceQueue>) -> Event<Arc<SourceQueue>> {
        let event = Event::new(source);
        self.inner
            .sources
            .lock()
            .expect("sources lock poisoned")
            .add(event.clone());
        event
    }

    fn is_idle(&self) -> bool {
        self.inner
            .queue
            .lock()
            .expect("turn queue poisoned")
            .is_empty()
    }

    fn has_exited(&self, exited: &Arc<Mutex<Option<Result<(), Error>>>>) -> bool {
        exited.lock().expect("exit slot poisoned").is_some()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("queue", &*self.inner.queue.lock().expect("turn queue poisoned"))
            .finish()
    }
}
