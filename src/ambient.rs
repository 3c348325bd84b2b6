//! The ambient runner: per-thread storage for the current actor's runner.
//!
//! Helpers that need the current runner would otherwise have to thread it
//! through every signature; the ambient slot lets them ask for it instead.
//! Each actor thread holds exactly one ambient runner, installed by the
//! actor entry for the thread's lifetime and released by an RAII guard.
//!
//! This is a convenience, not load-bearing: every API in the crate also
//! accepts an explicit runner.

use crate::runner::Runner;
use std::cell::RefCell;
use std::marker::PhantomData;

thread_local! {
    static AMBIENT_RUNNER: RefCell<Option<Runner>> = const { RefCell::new(None) };
}

/// Releases the ambient runner for the installing thread when dropped.
///
/// The guard is deliberately not `Send`: it must be dropped on the thread
/// that installed the runner.
#[must_use = "dropping the guard immediately uninstalls the ambient runner"]
pub struct AmbientGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        AMBIENT_RUNNER.with(|slot| slot.borrow_mut().take());
    }
}

/// Installs `runner` as the current thread's ambient runner.
///
/// # Panics
///
/// Panics if an ambient runner is already installed on this thread.
pub fn set_ambient_runner(runner: Runner) -> AmbientGuard {
    AMBIENT_RUNNER.with(|slot| {
        let mut slot = slot.borrow_mut();
        assert!(
            slot.is_none(),
            "an ambient runner is already installed on this thread"
        );
        *slot = Some(runner);
    });
    AmbientGuard {
        _not_send: PhantomData,
    }
}

/// Returns the current thread's ambient runner.
///
/// # Panics
///
/// Panics when called from a thread that is not hosting an actor.
#[must_use]
pub fn current_runner() -> Runner {
    AMBIENT_RUNNER
        .with(|slot| slot.borrow().clone())
        .expect("current_runner may only be called on a thread hosting an actor")
}
