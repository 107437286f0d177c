//! In-memory transport for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::envelope::check_envelope;
use crate::error::{ErrorKind, Result};
use crate::{ApiRequest, Transport};

/// Transport answering from canned JSON documents.
///
/// Responses are looked up by the request's full display form first
/// (`/api/texts/Genesis.1?context=1`), then by its path alone
/// (`/api/texts/Genesis.1`). Unknown requests fail with a 404
/// [`ErrorKind::Status`]. Every call is counted, including failed ones.
///
/// # Examples
///
/// ```
/// use folio_transport::{ApiRequest, Transport, backend::MockTransport};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = MockTransport::with_responses([
///     ("/api/links/Genesis.1.1", json!([{"anchorRef": "Genesis 1:1"}])),
/// ]);
/// let links = transport.get_json(&ApiRequest::new(["api", "links", "Genesis.1.1"])).await.unwrap();
/// assert_eq!(links[0]["anchorRef"], "Genesis 1:1");
/// assert_eq!(transport.calls(), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: RwLock<HashMap<String, Value>>,
    requests: RwLock<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn with_responses(responses: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Self {
            responses: RwLock::new(responses.into_iter().map(|(key, value)| (key.into(), value)).collect()),
            ..Self::default()
        }
    }

    /// Hold every response back for `delay`, so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn insert(&self, key: impl Into<String>, response: Value) {
        self.responses.write().await.insert(key.into(), response);
    }

    /// Total number of requests received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Display forms of every request received, in arrival order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_json(&self, request: &ApiRequest) -> Result<Value> {
        let key = request.to_string();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.write().await.push(key.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = {
            let responses = self.responses.read().await;
            responses.get(&key).or_else(|| responses.get(&request.path())).cloned()
        };
        match response {
            Some(value) => check_envelope(value),
            None => exn::bail!(ErrorKind::Status { status: 404, url: key }),
        }
    }
}
