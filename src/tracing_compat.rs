//! Logging facade over the `tracing` crate.
//!
//! The runtime logs list mutations and turn execution at `trace!`, manager
//! cycles at `debug!`, and lifecycle events at `info!`. Whether those
//! statements do anything is decided by the `tracing-integration` feature:
//!
//! - **Enabled**: the macros are re-exports from the `tracing` crate and
//!   emit structured events to whatever subscriber the application installs.
//! - **Disabled** (default): the macros expand to nothing, so the scheduler
//!   hot path carries no logging cost at all.
//!
//! Crate code imports the macros from here rather than from `tracing`
//! directly:
//!
//! ```rust,ignore
//! use crate::tracing_compat::{debug, trace};
//!
//! trace!(turn = %name, "append");
//! debug!(cycle = cycles, "snapshot drained");
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    //! No-op expansions used when `tracing-integration` is disabled.

    /// No-op trace-level logging macro.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug-level logging macro.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op info-level logging macro.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// No-op warn-level logging macro.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// No-op error-level logging macro.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }

    // `#[macro_export]` hoists the macros to the crate root; re-export them
    // here so call sites can import them from this module either way.
    pub use crate::{debug, error, info, trace, warn};
}

#[cfg(not(feature = "tracing-integration"))]
pub use noop::*;
