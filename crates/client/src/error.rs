//! Client Error Types
//!
//! Errors from the caches this crate wires together stay in their own
//! crates' types and are raised into these kinds with `or_raise`, keeping
//! the full tree for reporting.

use derive_more::{Display, Error};

/// A client error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP transport couldn't be set up from the configuration.
    #[display("could not set up the API transport")]
    Transport,
    /// The known titles couldn't be read or fetched.
    #[display("could not load book titles")]
    Titles,
    /// A name lookup failed.
    #[display("could not look up {_0:?}")]
    Name(#[error(not(source))] String),
    /// The input isn't a ref, even after repairing its capitalization.
    #[display("not a ref: {_0:?}")]
    NotARef(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Titles | Self::Name(_))
    }
}
