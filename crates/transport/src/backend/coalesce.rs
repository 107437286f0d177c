//! Coalescing transport wrapper.

use async_trait::async_trait;
use folio_asyncutils::Coalescer;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ErrorKind, Result};
use crate::{ApiRequest, Transport, TransportHandle};

type Outcome = std::result::Result<Value, ErrorKind>;

/// Wraps another transport so that identical requests issued while one is
/// still outstanding share its response.
///
/// Requests are identified by their display form. Once a request completes
/// (successfully or not) the next identical request goes to the inner
/// transport again; nothing is cached here.
#[derive(Clone)]
pub struct CoalescingTransport {
    inner: TransportHandle,
    requests: Coalescer<String, Outcome>,
}

impl CoalescingTransport {
    pub fn new(inner: TransportHandle) -> Self {
        Self { inner, requests: Coalescer::new() }
    }

    /// Number of distinct requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.requests.in_flight()
    }
}

#[async_trait]
impl Transport for CoalescingTransport {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get_json(&self, request: &ApiRequest) -> Result<Value> {
        let inner = Arc::clone(&self.inner);
        let owned = request.clone();
        self.requests
            .run(request.to_string(), move || async move {
                inner.get_json(&owned).await.map_err(|err| {
                    tracing::debug!(request = %owned, error = ?err, "Request failed");
                    (*err).clone()
                })
            })
            .await
            .map_err(exn::Exn::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockTransport;
    use serde_json::json;
    use std::time::Duration;

    fn transport() -> (Arc<MockTransport>, CoalescingTransport) {
        let mock = Arc::new(
            MockTransport::with_responses([("/api/links/Genesis.1.1", json!([{"anchorRef": "Genesis 1:1"}]))])
                .with_delay(Duration::from_millis(20)),
        );
        let coalescing = CoalescingTransport::new(mock.clone());
        (mock, coalescing)
    }

    #[tokio::test]
    async fn test_concurrent_identical_requests_share_one_call() {
        let (mock, transport) = transport();
        let request = ApiRequest::new(["api", "links", "Genesis.1.1"]);
        let (a, b, c) =
            tokio::join!(transport.get_json(&request), transport.get_json(&request), transport.get_json(&request));
        assert_eq!(a.unwrap(), b.unwrap());
        assert!(c.is_ok());
        assert_eq!(mock.calls(), 1);
        assert_eq!(transport.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_sequential_requests_are_not_cached() {
        let (mock, transport) = transport();
        let request = ApiRequest::new(["api", "links", "Genesis.1.1"]);
        transport.get_json(&request).await.unwrap();
        transport.get_json(&request).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter() {
        let (mock, transport) = transport();
        let request = ApiRequest::new(["api", "links", "Exodus.1.1"]);
        let (a, b) = tokio::join!(transport.get_json(&request), transport.get_json(&request));
        assert!(matches!(*a.unwrap_err(), ErrorKind::Status { status: 404, .. }));
        assert!(matches!(*b.unwrap_err(), ErrorKind::Status { status: 404, .. }));
        assert_eq!(mock.calls(), 1);
    }
}
