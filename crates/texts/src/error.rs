//! Text Cache Error Types

use derive_more::{Display, Error};

/// A text cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for text cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The text could not be fetched (network, status or server error).
    #[display("could not fetch text for {_0}")]
    Fetch(#[error(not(source))] String),
    /// The API answered with something that isn't a text payload.
    #[display("invalid text payload for {_0}")]
    InvalidPayload(#[error(not(source))] String),
    /// A context entry was found for a segment, but the section text it
    /// needs is not cached at any context level.
    #[display("no cached section {section} to build context for {segment}")]
    MissingContext {
        segment: String,
        section: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            // Fetching the section fills the gap.
            Self::Fetch(_) | Self::MissingContext { .. } => true,
            Self::InvalidPayload(_) => false,
        }
    }
}
