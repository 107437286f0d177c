//! HTTP transport backed by `reqwest`.

use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

use crate::envelope::check_envelope;
use crate::error::{ErrorKind, Result};
use crate::{ApiRequest, Transport};

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("folio/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Transport that sends every request to the API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, options: &HttpOptions) -> Result<Self> {
        let base_url = Url::parse(base_url).or_raise(|| ErrorKind::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            exn::bail!(ErrorKind::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .user_agent(options.user_agent.as_str())
            .build()
            .or_raise(|| ErrorKind::Network("could not build HTTP client".to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a request. Path segments are percent-encoded.
    pub fn url(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()
            .ok_or_raise(|| ErrorKind::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(level = "debug", skip(self), fields(request = %request))]
    async fn get_json(&self, request: &ApiRequest) -> Result<Value> {
        let url = self.url(request)?;
        let response =
            self.client.get(url.clone()).send().await.or_raise(|| ErrorKind::Network(format!("GET {url} failed")))?;
        let status = response.status();
        let body = response.bytes().await.or_raise(|| ErrorKind::Network(format!("reading body of {url} failed")))?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Received response");
        match serde_json::from_slice::<Value>(&body) {
            // Error envelopes are reported as server errors whatever the status.
            Ok(value) if status.is_success() || value.get("error").is_some() => check_envelope(value),
            Ok(_) => exn::bail!(ErrorKind::Status { status: status.as_u16(), url: url.to_string() }),
            Err(_) if !status.is_success() => {
                exn::bail!(ErrorKind::Status { status: status.as_u16(), url: url.to_string() })
            },
            Err(err) => Err(err).or_raise(|| ErrorKind::Decode(url.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(base, &HttpOptions::default()).unwrap()
    }

    #[test]
    fn test_url_escapes_segments() {
        let request = ApiRequest::new(["api", "texts", "Genesis 1:1"]).with_flag("context", true);
        let url = transport("https://example.org").url(&request).unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/texts/Genesis%201:1?context=1");
    }

    #[test]
    fn test_url_keeps_base_path() {
        let request = ApiRequest::new(["api", "links", "Genesis.1.1"]);
        let url = transport("https://example.org/mirror/").url(&request).unwrap();
        assert_eq!(url.as_str(), "https://example.org/mirror/api/links/Genesis.1.1");
    }

    #[test]
    fn test_rejects_invalid_base() {
        let err = HttpTransport::new("not a url", &HttpOptions::default()).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidUrl("not a url".to_string()));
        let err = HttpTransport::new("mailto:someone@example.org", &HttpOptions::default()).unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidUrl(_)));
    }
}
