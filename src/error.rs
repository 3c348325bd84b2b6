//! The computation-failure error type.
//!
//! The runtime distinguishes two error planes:
//!
//! - **Invariant violations** are programmer mistakes (double resolution,
//!   appending a linked turn, forwarding across managers). They abort the
//!   process with a panic carrying a precondition-failure message.
//! - **Computation failures** are first-class outcomes carried by resolvers
//!   and observed through continuations. [`Error`] is that outcome.
//!
//! An outcome may be observed by any number of continuations and by every
//! handle along a forwarding chain, so `Error` is cheaply cloneable: the
//! message lives behind an `Arc<str>`.

use std::sync::Arc;

/// A cloneable, thread-safe failure outcome for an asynchronous computation.
///
/// # Example
///
/// ```
/// use turnloop::Error;
///
/// let err = Error::new("connection reset");
/// assert_eq!(err.to_string(), "connection reset");
/// assert_eq!(err, err.clone());
/// ```
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    message: Arc<str>,
}

impl Error {
    /// Creates a new error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into().into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for Error {}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_message() {
        let err = Error::new("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn clones_compare_equal() {
        let err = Error::new("boom");
        assert_eq!(err, err.clone());
        assert_ne!(err, Error::new("bang"));
    }

    #[test]
    fn converts_from_str_and_string() {
        let a: Error = "boom".into();
        let b: Error = String::from("boom").into();
        assert_eq!(a, b);
    }

    #[test]
    fn implements_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&Error::new("boom"));
    }
}
