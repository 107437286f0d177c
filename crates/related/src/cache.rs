use exn::ResultExt;
use folio_refs::{RefParser, SectionLengths};
use folio_transport::backend::CoalescingTransport;
use folio_transport::{ApiRequest, TransportHandle};
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::instrument;

use crate::bucket::bucket_by_ref;
use crate::error::{ErrorKind, Result};
use crate::filter::filter_links;
use crate::models::{Anchored, Link, Note, RelatedBundle, Sheet};
use crate::store::ItemStore;

const LINKS: &str = "links";
const NOTES: &str = "notes";
const RELATED: &str = "related";

/// Links, notes and sheets by ref.
///
/// Cloning is cheap; clones share stores, parser and transport. Identical
/// requests in flight at the same time are sent once.
#[derive(Clone)]
pub struct RelatedCache {
    parser: Arc<RefParser>,
    transport: TransportHandle,
    lengths: Arc<dyn SectionLengths + Send + Sync>,
    private: bool,
    links: Arc<ItemStore<Link>>,
    notes: Arc<ItemStore<Note>>,
    sheets: Arc<ItemStore<Sheet>>,
}

impl RelatedCache {
    pub fn new(parser: Arc<RefParser>, transport: TransportHandle) -> Self {
        Self {
            transport: Arc::new(CoalescingTransport::new(transport)),
            lengths: Arc::new(()),
            private: false,
            links: Arc::new(ItemStore::new(Arc::clone(&parser))),
            notes: Arc::new(ItemStore::new(Arc::clone(&parser))),
            sheets: Arc::new(ItemStore::new(Arc::clone(&parser))),
            parser,
        }
    }

    /// Section sizes used to bucket items anchored to ranges that cross a
    /// section boundary. Usually the text cache.
    pub fn with_section_lengths(mut self, lengths: Arc<dyn SectionLengths + Send + Sync>) -> Self {
        self.lengths = lengths;
        self
    }

    /// Ask for the current user's private notes along with public ones.
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    /// Links of `reference`, fetched on a miss.
    #[instrument(level = "debug", skip(self))]
    pub async fn links(&self, reference: &str) -> Result<Arc<Vec<Link>>> {
        if let Some(cached) = self.links.get(reference) {
            return Ok(cached);
        }
        let request = self.request(LINKS, reference).with_flag("with_text", false);
        let links: Vec<Link> = self.fetch(LINKS, reference, &request).await?;
        Ok(self.save_items(&self.links, reference, links))
    }

    /// Links of every ref in `refs`, concatenated in order.
    pub async fn links_for(&self, refs: &[impl AsRef<str>]) -> Result<Vec<Link>> {
        let lists = try_join_all(refs.iter().map(|reference| self.links(reference.as_ref()))).await?;
        Ok(lists.iter().flat_map(|links| links.iter().cloned()).collect())
    }

    /// Notes on `reference`, fetched on a miss.
    #[instrument(level = "debug", skip(self))]
    pub async fn notes(&self, reference: &str) -> Result<Arc<Vec<Note>>> {
        if let Some(cached) = self.notes.get(reference) {
            return Ok(cached);
        }
        let request = self.with_privacy(self.request(NOTES, reference));
        let notes: Vec<Note> = self.fetch(NOTES, reference, &request).await?;
        Ok(self.save_items(&self.notes, reference, notes))
    }

    /// Sheets quoting `reference`. Sheets are only served in the related
    /// bundle, so a miss fetches the bundle.
    pub async fn sheets(&self, reference: &str) -> Result<Arc<Vec<Sheet>>> {
        if let Some(cached) = self.sheets.get(reference) {
            return Ok(cached);
        }
        let bundle = self.related(reference).await?;
        Ok(self.sheets.get(reference).unwrap_or_else(|| Arc::new(bundle.sheets.clone())))
    }

    /// Links, notes and sheets of `reference` in one request. Each part is
    /// cached as if fetched on its own; the bundle is served from the cache
    /// once all three are there.
    #[instrument(level = "debug", skip(self))]
    pub async fn related(&self, reference: &str) -> Result<RelatedBundle> {
        if let (Some(links), Some(notes), Some(sheets)) =
            (self.links.get(reference), self.notes.get(reference), self.sheets.get(reference))
        {
            return Ok(RelatedBundle { links: links.to_vec(), notes: notes.to_vec(), sheets: sheets.to_vec() });
        }
        let request = self.with_privacy(self.request(RELATED, reference));
        let bundle: RelatedBundle = self.fetch(RELATED, reference, &request).await?;
        self.save_items(&self.links, reference, bundle.links.clone());
        self.save_items(&self.notes, reference, bundle.notes.clone());
        self.save_items(&self.sheets, reference, bundle.sheets.clone());
        Ok(bundle)
    }

    /// Cached links of `reference` that pass any of `filters` (see
    /// [`LinkFilter`](crate::LinkFilter)). Nothing is fetched; an uncached
    /// ref has no links.
    pub fn links_filtered(&self, reference: &str, filters: &[impl AsRef<str>]) -> Vec<Link> {
        match self.links.get(reference) {
            Some(links) => filter_links(&links, filters, self.parser.index()),
            None => Vec::new(),
        }
    }

    pub fn cached_links(&self, reference: &str) -> Option<Arc<Vec<Link>>> {
        self.links.get(reference)
    }

    pub fn cached_notes(&self, reference: &str) -> Option<Arc<Vec<Note>>> {
        self.notes.get(reference)
    }

    pub fn cached_sheets(&self, reference: &str) -> Option<Arc<Vec<Sheet>>> {
        self.sheets.get(reference)
    }

    pub fn clear(&self) {
        self.links.clear();
        self.notes.clear();
        self.sheets.clear();
    }

    /// Keep the whole list under the requested ref and bucket it under the
    /// refs its items anchor to.
    fn save_items<T: Anchored + Clone>(&self, store: &ItemStore<T>, reference: &str, items: Vec<T>) -> Arc<Vec<T>> {
        let buckets = bucket_by_ref(&self.parser, self.lengths.as_ref(), &items);
        tracing::debug!(%reference, items = items.len(), buckets = buckets.len(), "Saving related items");
        store.merge(buckets);
        store.insert(reference, items)
    }

    fn request(&self, kind: &str, reference: &str) -> ApiRequest {
        ApiRequest::new(["api", kind, self.parser.normalize(reference).as_str()])
    }

    fn with_privacy(&self, request: ApiRequest) -> ApiRequest {
        if self.private { request.with_flag("private", true) } else { request }
    }

    async fn fetch<T: DeserializeOwned>(&self, kind: &'static str, reference: &str, request: &ApiRequest) -> Result<T> {
        let value = self.transport.get_json(request).await.or_raise(|| ErrorKind::Fetch {
            kind,
            reference: reference.to_string(),
        })?;
        serde_json::from_value(value).or_raise(|| ErrorKind::InvalidPayload { kind, reference: reference.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_refs::{IndexEntry, TitleIndex};
    use folio_transport::backend::MockTransport;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::time::Duration;

    fn parser() -> Arc<RefParser> {
        let mut index = TitleIndex::with_titles(["Genesis"]);
        index.add_index(IndexEntry::new("Rashi", ["Commentary"]));
        Arc::new(RefParser::new(index))
    }

    fn cache_with(mock: MockTransport) -> (Arc<MockTransport>, RelatedCache) {
        let mock = Arc::new(mock);
        let cache = RelatedCache::new(parser(), mock.clone());
        (mock, cache)
    }

    fn link(anchor: &str, category: &str, title: &str) -> Value {
        json!({"anchorRef": anchor, "sourceRef": format!("{title} on {anchor}"), "category": category,
            "collectiveTitle": {"en": title, "he": ""}})
    }

    fn section_links() -> Value {
        json!([
            link("Genesis 1:1", "Commentary", "Rashi"),
            link("Genesis 1:1-1:3", "Midrash", "Genesis Rabbah"),
            link("Genesis 1:2", "Quoting Commentary", "Rashi"),
        ])
    }

    #[tokio::test]
    async fn test_links_are_bucketed_by_anchor() {
        let (mock, cache) = cache_with(MockTransport::with_responses([("/api/links/Genesis.1", section_links())]));
        assert_eq!(cache.links("Genesis 1").await.unwrap().len(), 3);
        assert_eq!(cache.links("Genesis 1:1").await.unwrap().len(), 2);
        assert_eq!(cache.links("genesis 1:2").await.unwrap().len(), 2);
        assert_eq!(cache.links("Genesis 1:3").await.unwrap().len(), 1);
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.requests().await, ["/api/links/Genesis.1?with_text=0"]);
    }

    #[tokio::test]
    async fn test_broad_fetch_does_not_shrink_cached_bucket() {
        let (_, cache) = cache_with(MockTransport::with_responses([
            ("/api/links/Genesis.1.2", json!([
                link("Genesis 1:2", "Commentary", "Rashi"),
                link("Genesis 1:2", "Commentary", "Ramban"),
                link("Genesis 1:2", "Talmud", "Berakhot"),
            ])),
            ("/api/links/Genesis.1", section_links()),
        ]));
        assert_eq!(cache.links("Genesis 1:2").await.unwrap().len(), 3);
        cache.links("Genesis 1").await.unwrap();
        assert_eq!(cache.cached_links("Genesis 1:2").unwrap().len(), 3);
        assert_eq!(cache.cached_links("Genesis 1:1").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_filtered_links() {
        let (_, cache) = cache_with(MockTransport::with_responses([("/api/links/Genesis.1", section_links())]));
        assert!(cache.links_filtered("Genesis 1", &["Rashi"]).is_empty());
        cache.links("Genesis 1").await.unwrap();

        let rashi = cache.links_filtered("Genesis 1", &["Rashi"]);
        assert_eq!(rashi.len(), 1);
        assert_eq!(rashi[0].category, "Commentary");
        let quoting = cache.links_filtered("Genesis 1", &["Rashi|Quoting"]);
        assert_eq!(quoting.len(), 1);
        assert_eq!(quoting[0].anchor_ref, "Genesis 1:2");
        let none: [&str; 0] = [];
        assert_eq!(cache.links_filtered("Genesis 1", &none).len(), 3);
    }

    #[tokio::test]
    async fn test_links_for_many_refs() {
        let (mock, cache) = cache_with(MockTransport::with_responses([
            ("/api/links/Genesis.1.1", json!([link("Genesis 1:1", "Commentary", "Rashi")])),
            ("/api/links/Genesis.1.2", json!([link("Genesis 1:2", "Talmud", "Berakhot")])),
        ]));
        let links = cache.links_for(&["Genesis 1:1", "Genesis 1:2", "Genesis 1:1"]).await.unwrap();
        let titles: Vec<&str> = links.iter().map(|l| l.collective_title.en.as_str()).collect();
        assert_eq!(titles, ["Rashi", "Berakhot", "Rashi"]);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_coalesced() {
        let mock = MockTransport::with_responses([("/api/links/Genesis.1", section_links())])
            .with_delay(Duration::from_millis(20));
        let (mock, cache) = cache_with(mock);
        let (a, b) = tokio::join!(cache.links("Genesis 1"), cache.links("Genesis 1"));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_related_bundle_fills_every_store() {
        let bundle = json!({
            "links": section_links(),
            "notes": [{"anchorRef": "Genesis 1:3", "title": "Light", "text": "..."}],
            "sheets": [{"id": 7, "anchorRef": "Genesis 1:1-2", "title": "Creation"}]
        });
        let (mock, cache) = cache_with(MockTransport::with_responses([("/api/related/Genesis.1", bundle)]));
        let related = cache.related("Genesis 1").await.unwrap();
        assert_eq!(related.sheets[0].title, "Creation");

        assert_eq!(cache.notes("Genesis 1:3").await.unwrap()[0].title, "Light");
        assert_eq!(cache.sheets("Genesis 1:2").await.unwrap()[0].id, Some(7));
        assert_eq!(cache.links("Genesis 1:1").await.unwrap().len(), 2);
        cache.related("Genesis 1").await.unwrap();
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_private_notes_request() {
        let (mock, cache) = cache_with(MockTransport::with_responses([("/api/notes/Genesis.1", json!([]))]));
        let cache = cache.with_private(true);
        assert!(cache.notes("Genesis 1").await.unwrap().is_empty());
        assert_eq!(mock.requests().await, ["/api/notes/Genesis.1?private=1"]);
    }

    #[tokio::test]
    async fn test_fetch_errors_are_not_cached() {
        let (mock, cache) = cache_with(MockTransport::with_responses([(
            "/api/links/Genesis.1",
            json!({"error": "Something went wrong."}),
        )]));
        let err = cache.links("Genesis 1").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Fetch { kind: "links", reference: "Genesis 1".to_string() });
        assert!(cache.cached_links("Genesis 1").is_none());
        cache.links("Genesis 1").await.unwrap_err();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_spanning_anchor_uses_section_lengths() {
        let (_, cache) = cache_with(MockTransport::with_responses([(
            "/api/links/Genesis.1.31-2.1",
            json!([link("Genesis 1:30-2:1", "Midrash", "Genesis Rabbah")]),
        )]));
        let lengths: HashMap<String, u64> = HashMap::from([("Genesis 1".to_string(), 31)]);
        let cache = cache.with_section_lengths(Arc::new(lengths));
        cache.links("Genesis 1:31-2:1").await.unwrap();
        for reference in ["Genesis 1:30", "Genesis 1:31", "Genesis 2:1"] {
            assert_eq!(cache.cached_links(reference).unwrap().len(), 1, "{reference}");
        }
    }
}
