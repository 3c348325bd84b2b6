//! Auto-reset events for cross-thread signalling.
//!
//! An [`Event`] is the only primitive in the runtime that is touched from
//! outside the actor thread: I/O workers `signal` it when completions are
//! ready, and `close` it to unregister a source. The signal slot has
//! capacity one, so any number of signals between observations collapse to
//! a single wake-up (auto-reset).

use core::fmt;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

/// A one-slot auto-reset signal with an immutable user datum.
///
/// `signal` and `close` are thread-safe; the datum is set at construction
/// and never mutated. Cloning an event clones the handle, not the slot.
pub struct Event<D> {
    inner: Arc<EventInner<D>>,
}

struct EventInner<D> {
    /// The sending half; dropped on `close`, which every [`EventSet`]
    /// holding the receiver observes as disconnection.
    ///
    /// [`EventSet`]: crate::EventSet
    sender: Mutex<Option<Sender<()>>>,

    /// The receiving half, polled by the owning event set.
    receiver: Receiver<()>,

    /// Immutable context associated with the event, for application use.
    data: D,
}

impl<D> Event<D> {
    /// Creates a new unsignaled event carrying `data`.
    #[must_use]
    pub fn new(data: D) -> Self {
        // Capacity one so that a pending signal is kept in the slot and
        // further signals become non-blocking no-ops.
        let (sender, receiver) = bounded(1);
        Self {
            inner: Arc::new(EventInner {
                sender: Mutex::new(Some(sender)),
                receiver,
                data,
            }),
        }
    }

    /// Pulses the event, waking one waiter.
    ///
    /// Signals collapse: signalling an already-signaled event is a no-op, as
    /// is signalling a closed one.
    pub fn signal(&self) {
        if let Some(sender) = self
            .inner
            .sender
            .lock()
            .expect("event lock poisoned")
            .as_ref()
        {
            let _ = sender.try_send(());
        }
    }

    /// Closes the event.
    ///
    /// Closing is terminal: any event set containing this event discovers
    /// the close during its next selection and drops its membership.
    pub fn close(&self) {
        self.inner
            .sender
            .lock()
            .expect("event lock poisoned")
            .take();
    }

    /// Returns true once the event has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner
            .sender
            .lock()
            .expect("event lock poisoned")
            .is_none()
    }

    /// Returns the datum associated with this event.
    #[must_use]
    pub fn data(&self) -> &D {
        &self.inner.data
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.inner.receiver
    }

    /// Attempts to consume a pending signal without blocking.
    pub(crate) fn try_consume(&self) -> Result<(), TryRecvError> {
        self.inner.receiver.try_recv()
    }
}

impl<D> Clone for Event<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> fmt::Debug for Event<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("signaled", &!self.inner.receiver.is_empty())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_then_consume() {
        let event = Event::new(());
        event.signal();
        assert!(event.try_consume().is_ok());
        assert!(matches!(event.try_consume(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn double_signal_collapses_to_one() {
        let event = Event::new(());
        event.signal();
        event.signal();
        assert!(event.try_consume().is_ok());
        assert!(matches!(event.try_consume(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn close_disconnects_the_receiver() {
        let event = Event::new(());
        event.close();
        assert!(event.is_closed());
        assert!(matches!(
            event.try_consume(),
            Err(TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn pending_signal_survives_close() {
        let event = Event::new(());
        event.signal();
        event.close();
        // The buffered pulse is delivered before disconnection is reported.
        assert!(event.try_consume().is_ok());
        assert!(matches!(
            event.try_consume(),
            Err(TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn signal_after_close_is_ignored() {
        let event = Event::new(());
        event.close();
        event.signal();
        assert!(matches!(
            event.try_consume(),
            Err(TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn data_is_available_from_any_clone() {
        let event = Event::new("completion queue");
        let clone = event.clone();
        assert_eq!(*clone.data(), "completion queue");
    }

    #[test]
    fn signal_is_thread_safe() {
        let event = Event::new(());
        let remote = event.clone();
        let worker = std::thread::spawn(move || remote.signal());
        worker.join().expect("worker thread panicked");
        assert!(event.try_consume().is_ok());
    }
}
