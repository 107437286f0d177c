//! Transport Error Types
//!
//! Structured errors using `exn` for automatic location tracking. Kinds are
//! `Clone` so one failed request can be reported to every caller that was
//! waiting on it.

use derive_more::{Display, Error};

/// A transport error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never got a response (DNS, connection, timeout).
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The server answered with a non-success status and no error envelope.
    #[display("unexpected status {status} for {url}")]
    Status {
        status: u16,
        url: String,
    },
    /// The response body wasn't JSON.
    #[display("undecodable response from {_0}")]
    Decode(#[error(not(source))] String),
    /// The server reported an error in the `{"error": "..."}` envelope.
    #[display("server error: {_0}")]
    Server(#[error(not(source))] String),
    /// The base URL can't carry a path.
    #[display("invalid url: {_0}")]
    InvalidUrl(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) | Self::Server(_) | Self::InvalidUrl(_) => false,
        }
    }
}
