//! Ref Error Types
//!
//! Structured errors using `exn` for automatic location tracking. Parse
//! failures are memoized alongside successful parses, so [`ErrorKind`] is
//! cheap to clone and compare.

use derive_more::{Display, Error};

/// A ref error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ref operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing left to parse once the input was cleaned.
    #[display("empty ref")]
    Empty,
    /// No known title is a prefix of the input.
    #[display("unknown book: {_0}")]
    UnknownBook(#[error(not(source))] String),
    /// The text after the book title is not a section string.
    #[display("bad section string: {_0}")]
    BadSection(#[error(not(source))] String),
    /// The text after the range dash is not a section string, or is deeper
    /// than the start of the range.
    #[display("bad range string: {_0}")]
    BadRange(#[error(not(source))] String),
    /// A structured ref is missing a part needed to render it.
    #[display("incomplete ref: missing {_0}")]
    Incomplete(#[error(not(source))] &'static str),
    /// The title index document could not be read.
    #[display("invalid title index")]
    InvalidIndex,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A ref either parses against the loaded titles or it doesn't.
        false
    }
}
