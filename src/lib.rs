//! Turnloop: a single-threaded cooperative turn scheduler with a
//! promise-style result graph.
//!
//! # Model of computation
//!
//! An *actor* is a private execution context: one manager, one runner, one
//! OS thread. The manager owns a FIFO queue of *turns*: bounded synchronous
//! thunks that run to completion, never preempted. Asynchronous structure
//! comes from *promises*: a turn may allocate a promise, resolve one, or
//! chain a continuation onto one; the continuation itself runs later, as a
//! fresh turn. Nothing inside an actor blocks mid-turn; the only blocking
//! point is the manager's idle wait between cycles.
//!
//! The most basic way to start a computation is through the actor's runner:
//!
//! ```ignore
//! let result = runner.spawn(|| {
//!     // do something
//!     runner.done()
//! });
//! ```
//!
//! More commonly a computation expresses a dependency on an earlier one
//! with a combinator:
//!
//! ```ignore
//! let parsed = fetched.map(|body| parse(body));
//! ```
//!
//! Unless a continuation asks to observe the error (`then`, `or_else`), a
//! failed dependency skips the continuation entirely and fails its result
//! with the same error; failure propagates along the graph without
//! boilerplate at every step.
//!
//! Truly parallel work (blocking I/O, long computations) belongs on a
//! [`Source`], which runs it on a worker thread and delivers the completion
//! back to the actor as an ordinary turn:
//!
//! ```ignore
//! turnloop::run_actor(|runner| {
//!     let source = Source::new(&runner);
//!     source
//!         .spawn(|| std::fs::remove_file("stale.lock").map_err(|e| Error::new(e.to_string())))
//!         .finally(move || source.close())
//! })?;
//! ```
//!
//! # Guarantees
//!
//! - **FIFO with cycle boundaries**: turns on one manager run in enqueue
//!   order; a turn enqueued during cycle *k* runs no earlier than cycle
//!   *k + 1*, and completed I/O is ingested at every cycle boundary.
//! - **At-most-once resolution**: a promise resolves exactly once; double
//!   resolution is an invariant violation and aborts.
//! - **Ordered continuations**: continuations on one promise run in
//!   registration order, after resolution.
//! - **Forward transparency**: a forwarded promise is indistinguishable
//!   from its target to every observer.
//!
//! # Module structure
//!
//! - [`turn`]: turns and the circular turn list
//! - [`id`]: monotonic diagnostic identifiers
//! - [`event`] / [`event_set`]: auto-reset signalling between threads
//! - [`manager`]: the turn queue and the run loop
//! - [`promise`]: promise handles and combinators (the cells themselves live
//!   in a private module)
//! - [`runner`]: the facade actors use to start computations
//! - [`source`]: the bridge from parallel workers to cooperative turns
//! - [`actor`]: the `run_actor` entry point
//! - [`ambient`]: per-thread access to the current runner
//! - [`error`]: the computation-failure type
//! - [`tracing_compat`]: feature-gated logging macros

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod actor;
pub mod ambient;
pub mod error;
pub mod event;
pub mod event_set;
pub mod id;
pub mod manager;
pub mod promise;
mod resolver;
pub mod runner;
pub mod source;
pub mod tracing_compat;
pub mod turn;

pub use actor::run_actor;
pub use ambient::{current_runner, set_ambient_runner, AmbientGuard};
pub use error::Error;
pub use event::Event;
pub use event_set::EventSet;
pub use id::{UniqueId, UniqueIdGenerator};
pub use manager::Manager;
pub use promise::{Promise, Resolver};
pub use runner::Runner;
pub use source::Source;
pub use turn::{Turn, TurnList};
