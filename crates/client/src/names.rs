//! Name lookup through `/api/name`, with memoized responses.

use std::sync::Arc;

use dashmap::DashMap;
use exn::ResultExt;
use folio_transport::{ApiRequest, TransportHandle};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// What the API knows about a name: whether it's a ref, and the titles it
/// might be completing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameResponse {
    #[serde(default)]
    pub is_ref: bool,
    #[serde(default)]
    pub completions: Vec<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NameResponse {
    /// `true` when the query only failed to be a ref because of its
    /// capitalization or quote marks: the first completion matches the
    /// query's start once both are folded, but not as written.
    pub fn is_case_variant(&self, query: &str) -> bool {
        if self.is_ref {
            return false;
        }
        let Some(first) = self.completions.first() else {
            return false;
        };
        if first == query {
            return false;
        }
        let Some((prefix, _)) = split_chars(query, first.chars().count()) else {
            return false;
        };
        fold(first) == fold(prefix) && first != prefix
    }

    /// The query with its start replaced by the first completion, if the
    /// query is a case variant of it.
    pub fn repair(&self, query: &str) -> Option<String> {
        if !self.is_case_variant(query) {
            return None;
        }
        let first = self.completions.first()?;
        let (_, rest) = split_chars(query, first.chars().count())?;
        Some(format!("{first}{rest}"))
    }
}

/// Split after the first `count` chars, or `None` if `text` is shorter.
fn split_chars(text: &str, count: usize) -> Option<(&str, &str)> {
    match text.char_indices().nth(count) {
        Some((at, _)) => Some(text.split_at(at)),
        None if text.chars().count() == count => Some((text, "")),
        None => None,
    }
}

fn fold(text: &str) -> String {
    text.to_lowercase().replace('״', "\"")
}

/// Memoized name lookups, keyed by the name and whether only refs were
/// asked for.
#[derive(Clone)]
pub struct NameCache {
    transport: TransportHandle,
    responses: Arc<DashMap<(String, bool), Arc<NameResponse>>>,
}

impl NameCache {
    pub fn new(transport: TransportHandle) -> Self {
        Self { transport, responses: Arc::new(DashMap::new()) }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn lookup(&self, name: &str, ref_only: bool) -> Result<Arc<NameResponse>> {
        let key = (name.to_string(), ref_only);
        if let Some(response) = self.responses.get(&key) {
            return Ok(Arc::clone(response.value()));
        }
        let mut request = ApiRequest::new(["api", "name", name]);
        if ref_only {
            request = request.with_flag("ref_only", true);
        }
        let value = self.transport.get_json(&request).await.or_raise(|| ErrorKind::Name(name.to_string()))?;
        let response: NameResponse = serde_json::from_value(value).or_raise(|| ErrorKind::Name(name.to_string()))?;
        let response = Arc::new(response);
        self.responses.insert(key, Arc::clone(&response));
        Ok(response)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn clear(&self) {
        self.responses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_transport::backend::MockTransport;
    use rstest::rstest;
    use serde_json::json;

    fn response(is_ref: bool, completions: &[&str]) -> NameResponse {
        NameResponse {
            is_ref,
            completions: completions.iter().map(|c| c.to_string()).collect(),
            ..NameResponse::default()
        }
    }

    #[rstest]
    #[case(false, &["Genesis"], "genesis 1:1", true)]
    #[case(false, &["Genesis"], "GENESIS", true)]
    #[case(true, &["Genesis"], "genesis 1:1", false)]
    #[case(false, &["Genesis"], "Genesis 1:1", false)]
    #[case(false, &["Genesis"], "Genesis", false)]
    #[case(false, &["Exodus"], "genesis 1:1", false)]
    #[case(false, &[], "genesis 1:1", false)]
    #[case(false, &["Genesis Rabbah"], "gen", false)]
    #[case(false, &["שו״ע"], "שו\"ע", true)]
    fn test_is_case_variant(
        #[case] is_ref: bool,
        #[case] completions: &[&str],
        #[case] query: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(response(is_ref, completions).is_case_variant(query), expected);
    }

    #[test]
    fn test_repair() {
        let response = response(false, &["Genesis"]);
        assert_eq!(response.repair("genesis 1:1").as_deref(), Some("Genesis 1:1"));
        assert_eq!(response.repair("Genesis 1:1"), None);
    }

    #[test]
    fn test_repair_counts_chars() {
        let response = response(false, &["שו״ע"]);
        assert_eq!(response.repair("שו\"ע או\"ח 1").as_deref(), Some("שו״ע או\"ח 1"));
    }

    #[tokio::test]
    async fn test_lookup_is_memoized() {
        let mock = Arc::new(MockTransport::with_responses([(
            "/api/name/genesis",
            json!({"is_ref": false, "completions": ["Genesis"], "type": "ref"}),
        )]));
        let names = NameCache::new(mock.clone());
        let first = names.lookup("genesis", false).await.unwrap();
        let second = names.lookup("genesis", false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.kind.as_deref(), Some("ref"));
        assert_eq!(mock.calls(), 1);
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_ref_only_flag() {
        let mock = Arc::new(MockTransport::with_responses([(
            "/api/name/genesis?ref_only=1",
            json!({"is_ref": true, "completions": ["Genesis"]}),
        )]));
        let names = NameCache::new(mock.clone());
        assert!(names.lookup("genesis", true).await.unwrap().is_ref);
        assert_eq!(mock.requests().await, ["/api/name/genesis?ref_only=1"]);
    }

    #[tokio::test]
    async fn test_lookup_failure() {
        let names = NameCache::new(Arc::new(MockTransport::default()));
        let err = names.lookup("nothing", false).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Name("nothing".to_string()));
        assert!(names.is_empty());
    }
}
