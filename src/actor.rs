//! The actor entry point: one manager, one runner, one OS thread.
//!
//! [`run_actor`] hosts a contained cooperative environment on a dedicated
//! thread and drives it until the root computation resolves. The caller
//! blocks until then and receives the root's outcome.

use crate::ambient::set_ambient_runner;
use crate::error::Error;
use crate::manager::Manager;
use crate::promise::Promise;
use crate::runner::Runner;
use crate::tracing_compat::info;
use std::thread;

/// Runs `root` inside a fresh actor and returns its outcome.
///
/// A dedicated thread is spawned hosting one manager and one runner; the
/// runner is installed as the thread's ambient runner for the duration.
/// `root` is invoked from the first turn and the manager keeps running
/// until the promise it returned resolves, including any I/O sources and
/// descendant computations it started along the way.
///
/// # Errors
///
/// Returns the root computation's failure, or an error when the actor
/// thread could not be spawned.
///
/// # Panics
///
/// A panic on the actor thread (an invariant violation, or a panic in user
/// code) resumes on the caller.
pub fn run_actor<F>(root: F) -> Result<(), Error>
where
    F: FnOnce(Runner) -> Promise<()> + Send + 'static,
{
    let actor = thread::Builder::new()
        .name("actor".to_string())
        .spawn(move || {
            let manager = Manager::new();
            let runner = Runner::new(&manager);
            let _ambient = set_ambient_runner(runner.clone());

            // The main result tracks the completion of the root computation.
            let (main, main_resolver) = runner.new_result::<()>();

            let root_runner = runner.clone();
            manager.new_turn("Main", move || {
                let _ = root(root_runner).then(move |outcome| {
                    info!(ok = outcome.is_ok(), "actor completed");
                    main_resolver.resolve(outcome.clone());
                    outcome
                });
            });

            manager.run_until(main)
        })
        .map_err(|e| Error::new(format!("failed to spawn actor thread: {e}")))?;

    match actor.join() {
        Ok(outcome) => outcome,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ambient::current_runner;

    #[test]
    fn a_trivial_actor_returns_success() {
        assert!(run_actor(|runner| runner.done()).is_ok());
    }

    #[test]
    fn a_failing_actor_returns_the_error() {
        let err = run_actor(|runner| runner.new_error("boom")).expect_err("root failed");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn the_ambient_runner_is_installed_for_the_actor() {
        let outcome = run_actor(|runner| {
            let ambient = current_runner();
            assert!(ambient.manager().is_same(runner.manager()));
            runner.done()
        });
        assert!(outcome.is_ok());
    }

    #[test]
    fn actors_are_independent() {
        assert!(run_actor(|runner| runner.done()).is_ok());
        let err = run_actor(|runner| runner.new_error("second")).expect_err("root failed");
        assert_eq!(err.to_string(), "second");
    }

    #[test]
    #[should_panic(expected = "already resolved")]
    fn invariant_violations_in_the_actor_resume_on_the_caller() {
        let _ = run_actor(|runner| {
            let (promise, resolver) = runner.new_result::<()>();
            resolver.complete(());
            resolver.complete(());
            promise
        });
    }
}
