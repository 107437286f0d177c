//! Related Data Error Types

use derive_more::{Display, Error};

/// A related data error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for related data operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The items could not be fetched (network, status or server error).
    #[display("could not fetch {kind} for {reference}")]
    Fetch {
        kind: &'static str,
        reference: String,
    },
    /// The API answered with something that isn't a list of items.
    #[display("invalid {kind} payload for {reference}")]
    InvalidPayload {
        kind: &'static str,
        reference: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
