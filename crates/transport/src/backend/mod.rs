//! Transport trait and implementations.
//!
//! Caches talk to the API through [`Transport`], so they can be handed a real
//! HTTP client, a coalescing wrapper around one, or (in tests) canned
//! responses.

mod coalesce;
mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::coalesce::CoalescingTransport;
pub use self::http::{HttpOptions, HttpTransport};
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockTransport;
use crate::error::Result;
use crate::request::ApiRequest;
use async_trait::async_trait;
use serde_json::Value;

/// Fetches JSON documents from the API.
///
/// Implementations return the decoded body. A body carrying the API's error
/// envelope (`{"error": "..."}`) is reported as
/// [`ErrorKind::Server`](crate::error::ErrorKind::Server), never as a value.
///
/// # Examples
///
/// ```
/// use folio_transport::{ApiRequest, Transport, error::Result};
///
/// async fn link_count(transport: &dyn Transport, reference: &str) -> Result<usize> {
///     let request = ApiRequest::new(["api", "links", reference]);
///     let links = transport.get_json(&request).await?;
///     Ok(links.as_array().map_or(0, Vec::len))
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for log output.
    fn name(&self) -> &str;

    async fn get_json(&self, request: &ApiRequest) -> Result<Value>;
}
