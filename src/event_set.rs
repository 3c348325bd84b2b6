//! A single-thread-owned collection of events to monitor.
//!
//! The event set is the manager's window onto its I/O sources: a
//! non-blocking [`select`](EventSet::select) at the top of every cycle
//! ingests whatever completed while turns were running, and a blocking
//! [`wait`](EventSet::wait) parks the actor thread when the queue runs dry.
//!
//! The set itself is not thread-safe; exactly one thread owns it. Events it
//! holds may be signaled and closed from anywhere. Closed members are
//! discovered lazily during selection and removed by swapping with the last
//! element. Once the set is empty both `select` and `wait` return `None`
//! immediately, which the run loop treats as its termination signal.

use crate::event::Event;
use core::fmt;
use crossbeam_channel::{Select, TryRecvError};

/// A set of events watched for asynchronous signalling.
pub struct EventSet<D> {
    events: Vec<Event<D>>,
}

impl<D> EventSet<D> {
    /// Creates a new empty event set.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Returns the number of live events in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the set holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Registers an event with the set.
    ///
    /// Registered events are returned by `select`/`wait` when they become
    /// signaled. Closing the event is the only way to unregister it.
    pub fn add(&mut self, event: Event<D>) {
        self.events.push(event);
    }

    /// Returns a signaled event, or `None` if nothing is signaled right now.
    ///
    /// Never blocks. Returns `None` immediately when the set is empty.
    pub fn select(&mut self) -> Option<Event<D>> {
        self.choose(false)
    }

    /// Returns a signaled event, blocking until one becomes signaled or the
    /// set empties out through member closes.
    pub fn wait(&mut self) -> Option<Event<D>> {
        self.choose(true)
    }

    fn choose(&mut self, block: bool) -> Option<Event<D>> {
        loop {
            if self.events.is_empty() {
                return None;
            }

            let index = {
                let mut select = Select::new();
                for event in &self.events {
                    select.recv(event.receiver());
                }
                if block {
                    select.ready()
                } else {
                    match select.try_ready() {
                        Ok(index) => index,
                        Err(_) => return None,
                    }
                }
            };

            match self.events[index].try_consume() {
                Ok(()) => return Some(self.events[index].clone()),
                Err(TryRecvError::Disconnected) => {
                    // Closed member: swap with the last element and drop it.
                    self.events.swap_remove(index);
                }
                Err(TryRecvError::Empty) => {
                    // Readiness was consumed elsewhere between the probe and
                    // the receive; go around again.
                }
            }
        }
    }
}

impl<D> Default for EventSet<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for EventSet<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSet")
            .field("events", &self.events.len())
            .finish()
    }
}
