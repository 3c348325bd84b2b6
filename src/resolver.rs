//! The promise cell: storage for an asynchronous outcome.
//!
//! A cell is in exactly one of three states:
//!
//! - **Pending**: unresolved, holding the list of continuation turns parked
//!   until resolution;
//! - **Forwarded**: redirected to take its outcome from another cell;
//! - **Resolved**: holding the final outcome, a `Result<T, Error>`.
//!
//! Resolution is a one-way, at-most-once transition. Resolving drains the
//! parked continuations onto the manager queue in registration order, so
//! resolution happens-before every continuation attached before it.
//!
//! Forwarding records the *end* of the target's own chain, which keeps
//! chains shallow without explicit path compression; continuations attach
//! to, and outcomes are read from, the chain tail. Both cells of a forward
//! must belong to the same manager, and chains are acyclic by construction:
//! a forward target is always a result created before the call.
//!
//! Cells are shared (`Arc`) between the public [`Promise`]/[`Resolver`]
//! handles, the continuation turns that reference them, and forwarding
//! links; the cell lives as long as its longest holder.
//!
//! [`Promise`]: crate::Promise
//! [`Resolver`]: crate::Resolver

use crate::error::Error;
use crate::manager::Manager;
use crate::turn::{Turn, TurnList};
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};

/// The state machine inside a cell.
enum State<T> {
    /// Unresolved; the list holds continuations awaiting the outcome.
    Pending(TurnList),
    /// Redirected: the outcome will be whatever the target resolves to.
    Forwarded(Arc<Cell<T>>),
    /// Final.
    Resolved(Result<T, Error>),
}

/// A shared promise cell bound to a manager.
pub(crate) struct Cell<T> {
    /// The manager whose queue continuation turns are scheduled on.
    manager: Manager,

    state: Mutex<State<T>>,
}

impl<T> Cell<T> {
    /// Creates a new unresolved cell bound to `manager`.
    pub(crate) fn new(manager: Manager) -> Arc<Self> {
        Arc::new(Self {
            manager,
            state: Mutex::new(State::Pending(TurnList::new())),
        })
    }

    /// Creates a cell that is born resolved with `outcome`.
    pub(crate) fn resolved(manager: Manager, outcome: Result<T, Error>) -> Arc<Self> {
        Arc::new(Self {
            manager,
            state: Mutex::new(State::Resolved(outcome)),
        })
    }

    pub(crate) fn manager(&self) -> &Manager {
        &self.manager
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().expect("resolver lock poisoned")
    }

    /// Completes the cell with `outcome` and wakes its continuations.
    ///
    /// # Panics
    ///
    /// Panics if the cell is already resolved or has been forwarded.
    pub(crate) fn resolve(&self, outcome: Result<T, Error>) {
        let pending = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(turns) => {
                    let turns = mem::take(turns);
                    *state = State::Resolved(outcome);
                    turns
                }
                State::Forwarded(_) => {
                    panic!("cannot resolve a result that has been forwarded")
                }
                State::Resolved(_) => {
                    panic!("cannot resolve an already resolved result")
                }
            }
        };

        // The cell is resolved now, so each parked continuation goes
        // straight onto the manager queue, preserving registration order.
        self.queue_list(pending);
    }

    /// Redirects the cell to take its outcome from `target`.
    ///
    /// Parked continuations are re-queued onto the end of the target's
    /// forwarding chain.
    ///
    /// # Panics
    ///
    /// Panics if the cell is already resolved or forwarded, if the two cells
    /// belong to different managers, or if the forward would point the cell
    /// at itself.
    pub(crate) fn forward(&self, target: &Arc<Self>) {
        assert!(
            self.manager.is_same(target.manager()),
            "cannot forward a result across managers"
        );

        let tail = Cell::tail(target);
        assert!(
            !std::ptr::eq(self, tail.as_ref()),
            "cannot forward a result to itself"
        );

        let pending = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(turns) => {
                    let turns = mem::take(turns);
                    *state = State::Forwarded(Arc::clone(&tail));
                    turns
                }
                State::Forwarded(_) => {
                    panic!("cannot forward a result that is already forwarded")
                }
                State::Resolved(_) => {
                    panic!("cannot forward an already resolved result")
                }
            }
        };

        tail.queue_list(pending);
    }

    /// Walks the forwarding chain from `start` and returns its final cell.
    pub(crate) fn tail(start: &Arc<Self>) -> Arc<Self> {
        let mut current = Arc::clone(start);
        loop {
            let next = {
                let state = current.lock();
                match &*state {
                    State::Forwarded(next) => Some(Arc::clone(next)),
                    _ => None,
                }
            };
            match next {
                Some(next) => current = next,
                None => return current,
            }
        }
    }

    /// Returns true if this cell itself holds an outcome (does not follow
    /// forwarding links).
    pub(crate) fn is_resolved_here(&self) -> bool {
        matches!(&*self.lock(), State::Resolved(_))
    }

    pub(crate) fn state_name(&self) -> &'static str {
        match &*self.lock() {
            State::Pending(_) => "pending",
            State::Forwarded(_) => "forwarded",
            State::Resolved(_) => "resolved",
        }
    }

    /// Schedules `turn` to run once this cell resolves.
    ///
    /// A resolved cell hands the turn straight to the manager; a pending
    /// cell parks it; a forwarded cell delegates to the end of its chain.
    pub(crate) fn queue_turn(&self, turn: Arc<Turn>) {
        let target = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(turns) => {
                    turns.append(turn);
                    return;
                }
                State::Resolved(_) => None,
                State::Forwarded(next) => Some(Arc::clone(next)),
            }
        };
        match target {
            None => self.manager.queue_turn(turn),
            Some(next) => Cell::tail(&next).queue_turn(turn),
        }
    }

    fn queue_list(&self, mut turns: TurnList) {
        while !turns.is_empty() {
            self.queue_turn(turns.remove_head());
        }
    }
}

impl<T: Clone> Cell<T> {
    /// Returns a copy of the outcome if this cell itself is resolved.
    pub(crate) fn outcome_if_resolved(&self) -> Option<Result<T, Error>> {
        match &*self.lock() {
            State::Resolved(outcome) => Some(outcome.clone()),
            _ => None,
        }
    }
}

impl<T: Clone + Send + 'static> Cell<T> {
    /// Attaches a continuation to `start` and returns the cell for its
    /// result.
    ///
    /// This is the single binding point behind every public combinator. The
    /// adapter `k` receives the source outcome and the outer cell, and is
    /// responsible for resolving or forwarding the outer cell; each
    /// combinator encodes its own argument/return shape and short-circuit
    /// rule in its adapter.
    pub(crate) fn when<U, K>(start: &Arc<Self>, k: K) -> Arc<Cell<U>>
    where
        U: Send + 'static,
        K: FnOnce(Result<T, Error>, &Arc<Cell<U>>) + Send + 'static,
    {
        // Continuations always attach to the current end of a chain.
        let cell = Cell::tail(start);
        let outer = Cell::new(cell.manager().clone());
        let name = format!("When{}", cell.manager().next_id());

        let source = Arc::clone(&cell);
        let outer_for_turn = Arc::clone(&outer);
        let turn = Turn::new(name, move || {
            // The cell may have been forwarded again after the turn was
            // parked; the outcome always lives at the end of the chain.
            let tail = Cell::tail(&source);
            let outcome = tail
                .outcome_if_resolved()
                .expect("a continuation only runs after its result resolved");
            k(outcome, &outer_for_turn);
        });
        cell.queue_turn(turn);
        outer
    }
}
