//! Turns and the circular turn list.
//!
//! A [`Turn`] is a bounded synchronous computation: a one-shot thunk plus a
//! diagnostic name. Turns are executed to completion, never preempted, and
//! may be members of at most one [`TurnList`] at a time.
//!
//! A non-empty list is a circular singly-linked ring addressed by its
//! *tail*, so `tail.next` is the head and appending stays O(1):
//!
//! ```text
//!            ┌─────────────────────────────┐
//!            ▼                             │
//!         ┌──────┐   ┌──────┐   ┌──────┐   │
//!         │ head │──►│  ..  │──►│ tail │───┘
//!         └──────┘   └──────┘   └──────┘
//!                                  ▲
//!                       TurnList ──┘
//! ```
//!
//! A turn's `next` link doubles as its membership flag: `next` is `None`
//! exactly when the turn is detached. Every mutation that removes a turn
//! from a ring clears its link, which is what makes [`TurnList::unlink`]
//! idempotent.
//!
//! All operations are O(1) except `unlink`, which walks the ring.

use crate::tracing_compat::trace;
use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// The function executed when a turn runs.
type Thunk = Box<dyn FnOnce() + Send + 'static>;

/// A bounded synchronous computation scheduled on a manager.
///
/// Turns are shared through `Arc`; identity (for [`TurnList::unlink`]) is
/// pointer identity.
pub struct Turn {
    /// Diagnostic string identifying the purpose of the turn.
    name: String,

    inner: Mutex<TurnInner>,
}

struct TurnInner {
    /// The thunk, present until the turn has been executed.
    thunk: Option<Thunk>,

    /// The next turn in the ring, or `None` when detached.
    next: Option<Arc<Turn>>,
}

impl Turn {
    /// Creates a new detached turn that will call `f` when run.
    pub fn new(name: impl Into<String>, f: impl FnOnce() + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            inner: Mutex::new(TurnInner {
                thunk: Some(Box::new(f)),
                next: None,
            }),
        })
    }

    /// Returns the diagnostic name of the turn.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the turn is currently a member of a list.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.lock().next.is_some()
    }

    /// Executes the turn.
    ///
    /// # Panics
    ///
    /// Panics if the turn is still linked into a list or has already been
    /// executed.
    pub fn run(&self) {
        let thunk = {
            let mut inner = self.lock();
            assert!(
                inner.next.is_none(),
                "cannot execute a turn that is linked into a list: {}",
                self.name
            );
            inner.thunk.take()
        };
        let thunk = thunk.unwrap_or_else(|| {
            panic!("turn {} has already been executed", self.name);
        });

        trace!(turn = %self.name, "run");
        thunk();
    }

    fn lock(&self) -> MutexGuard<'_, TurnInner> {
        self.inner.lock().expect("turn lock poisoned")
    }

    fn next(&self) -> Option<Arc<Self>> {
        self.lock().next.clone()
    }

    fn set_next(&self, next: Option<Arc<Self>>) {
        self.lock().next = next;
    }
}

impl fmt::Debug for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Turn")
            .field("name", &self.name)
            .field("linked", &inner.next.is_some())
            .field("executed", &inner.thunk.is_none())
            .finish()
    }
}

/// A FIFO list of turns, represented by its tail handle.
///
/// The empty list is the `None` tail; every non-empty list is a circular
/// ring. `append` and `remove_head` are O(1); `unlink` is O(n).
#[derive(Default)]
pub struct TurnList {
    tail: Option<Arc<Turn>>,
}

/// Panic message for a ring whose links have been corrupted externally.
const RING: &str = "a non-empty ring always links back to its head";

impl TurnList {
    /// Creates a new empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { tail: None }
    }

    /// Returns true if the list holds no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tail.is_none()
    }

    /// Returns the number of turns in the list by walking the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        let Some(tail) = &self.tail else { return 0 };
        let mut count = 1;
        let mut cursor = tail.next().expect(RING);
        while !Arc::ptr_eq(&cursor, tail) {
            cursor = cursor.next().expect(RING);
            count += 1;
        }
        count
    }

    /// Appends a turn at the end of the list.
    ///
    /// # Panics
    ///
    /// Panics if `add` is already a member of a list.
    pub fn append(&mut self, add: Arc<Turn>) {
        assert!(
            !add.is_linked(),
            "cannot append a turn that is already in a list: {}",
            add.name()
        );
        trace!(turn = %add.name(), "append");

        match self.tail.take() {
            None => {
                // Link the single element to itself to complete the circle.
                add.set_next(Some(Arc::clone(&add)));
                self.tail = Some(add);
            }
            Some(tail) => {
                let head = tail.next().expect(RING);
                add.set_next(Some(head));
                tail.set_next(Some(Arc::clone(&add)));
                self.tail = Some(add);
            }
        }
    }

    /// Returns the turn at the head of the list without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<Arc<Turn>> {
        self.tail.as_ref().map(|tail| tail.next().expect(RING))
    }

    /// Removes and returns the head of the list, detached.
    ///
    /// # Panics
    ///
    /// Panics if the list is empty.
    pub fn remove_head(&mut self) -> Arc<Turn> {
        let tail = self
            .tail
            .take()
            .expect("cannot remove the head of an empty turn list");
        let head = tail.next().expect(RING);

        if Arc::ptr_eq(&head, &tail) {
            head.set_next(None);
        } else {
            let second = head.next().expect(RING);
            tail.set_next(Some(second));
            head.set_next(None);
            self.tail = Some(tail);
        }

        trace!(turn = %head.name(), "remove_head");
        head
    }

    /// Removes a turn from anywhere in the list and detaches it.
    ///
    /// Unlinking a turn that is not in any list is a no-op, so `unlink` is
    /// idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the turn is linked but is not a member of this list.
    pub fn unlink(&mut self, turn: &Arc<Turn>) {
        if !turn.is_linked() {
            trace!(turn = %turn.name(), "unlink no-op");
            return;
        }

        let tail = Arc::clone(
            self.tail
                .as_ref()
                .expect("cannot unlink from an empty turn list"),
        );
        let head = tail.next().expect(RING);
        trace!(turn = %turn.name(), "unlink");

        // A single-element ring had better contain the turn being unlinked.
        if Arc::ptr_eq(&tail, &head) {
            assert!(
                Arc::ptr_eq(&tail, turn),
                "turn {} is not a member of this list",
                turn.name()
            );
            turn.set_next(None);
            self.tail = None;
            return;
        }

        // Head removal: the tail is the predecessor.
        if Arc::ptr_eq(&head, turn) {
            let after = turn.next().expect(RING);
            tail.set_next(Some(after));
            turn.set_next(None);
            return;
        }

        // Walk the ring to find the predecessor of the turn.
        let mut before = head;
        loop {
            let candidate = before.next().expect(RING);
            if Arc::ptr_eq(&candidate, turn) {
                break;
            }
            assert!(
                !Arc::ptr_eq(&before, &tail),
                "turn {} is not a member of this list",
                turn.name()
            );
            before = candidate;
        }

        let after = turn.next().expect(RING);
        before.set_next(Some(after));
        turn.set_next(None);

        if Arc::ptr_eq(turn, &tail) {
            self.tail = Some(before);
        }
    }
}

impl Drop for TurnList {
    fn drop(&mut self) {
        // Break the ring so the turn Arcs can be reclaimed.
        while self.tail.is_some() {
            let _ = self.remove_head();
        }
    }
}

// Rendering walks the ring, so keep Debug output out of hot paths.
impl fmt::Debug for TurnList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(tail) = &self.tail else {
            return write!(f, "<empty>");
        };
        write!(f, "{{")?;
        let mut cursor = tail.next().expect(RING);
        loop {
            write!(f, " {}", cursor.name())?;
            if Arc::ptr_eq(&cursor, tail) {
                break;
            }
            cursor = cursor.next().expect(RING);
        }
        write!(f, " }}")
    }
}
