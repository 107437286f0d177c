use exn::{OptionExt, ResultExt};
use folio_refs::{RefParser, SectionLengths};
use folio_transport::backend::CoalescingTransport;
use folio_transport::{ApiRequest, TransportHandle};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::key::CacheKey;
use crate::models::{CacheEntry, TextPayload, TextSettings};
use crate::split::{Batch, decompose};

type Entries = HashMap<CacheKey, CacheEntry>;

/// Text payloads by ref, fetched on demand and kept for the life of the
/// cache.
///
/// Cloning is cheap; clones share entries, parser and transport. Identical
/// requests in flight at the same time are sent once.
///
/// # Examples
///
/// ```
/// use folio_refs::{RefParser, TitleIndex};
/// use folio_texts::{TextCache, TextContent, TextPayload, TextSettings};
/// use folio_transport::backend::MockTransport;
/// use std::sync::Arc;
///
/// let parser = Arc::new(RefParser::new(TitleIndex::with_titles(["Genesis"])));
/// let cache = TextCache::new(parser, Arc::new(MockTransport::default()));
/// let payload: TextPayload = serde_json::from_str(
///     r#"{"ref": "Genesis 1", "text": ["x", "y"], "he": [], "sections": [1], "toSections": [1], "textDepth": 2}"#,
/// )
/// .unwrap();
/// cache.save(payload, &TextSettings::default());
///
/// let verse = cache.get("genesis.1.2", &TextSettings::default()).unwrap().unwrap();
/// assert_eq!(verse.text, TextContent::from("y"));
/// ```
#[derive(Clone)]
pub struct TextCache {
    parser: Arc<RefParser>,
    transport: TransportHandle,
    entries: Arc<RwLock<Entries>>,
    prefetch_spanning: bool,
}

impl TextCache {
    pub fn new(parser: Arc<RefParser>, transport: TransportHandle) -> Self {
        Self {
            parser,
            transport: Arc::new(CoalescingTransport::new(transport)),
            entries: Arc::new(RwLock::new(Entries::new())),
            prefetch_spanning: true,
        }
    }

    /// Whether saving a spanning payload fetches each section it spans in
    /// the background. On by default.
    pub fn with_prefetch_spanning(mut self, prefetch: bool) -> Self {
        self.prefetch_spanning = prefetch;
        self
    }

    pub fn parser(&self) -> &RefParser {
        &self.parser
    }

    /// Number of entries, placeholders included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// The API request that fetches `reference` with `settings`.
    pub fn request(&self, reference: &str, settings: &TextSettings) -> ApiRequest {
        let mut segments = vec!["api".to_string(), "texts".to_string(), self.parser.normalize(reference)];
        if let Some((language, version)) = settings.version_pair() {
            segments.push(language.to_string());
            segments.push(version.replace(' ', "_"));
        }
        ApiRequest::new(segments)
            .with_flag("commentary", settings.commentary)
            .with_flag("context", settings.context)
            .with_flag("pad", settings.pad)
            .with_flag("wrapLinks", settings.wrap_links)
    }

    /// Read from the cache without fetching.
    ///
    /// A context entry is assembled from the cached segment and the cached
    /// text of its section; if either is missing this fails with
    /// [`ErrorKind::MissingContext`].
    pub fn get(&self, reference: &str, settings: &TextSettings) -> Result<Option<Arc<TextPayload>>> {
        let key = CacheKey::new(&self.parser, reference, settings);
        let entry = self.read().get(&key).cloned();
        match entry {
            None => {
                tracing::trace!(%key, "Text cache miss");
                Ok(None)
            },
            Some(CacheEntry::Resolved(payload)) => Ok(Some(payload)),
            Some(CacheEntry::Placeholder { reference, section_ref }) => {
                let built = self.build_context(&reference, &section_ref, settings)?;
                tracing::debug!(%key, %section_ref, "Built segment in context");
                Ok(Some(self.resolve_placeholder(&key, built)))
            },
        }
    }

    /// Read from the cache, fetching (and saving) on a miss.
    ///
    /// A context entry whose section is no longer cached counts as a miss.
    /// A server error envelope is returned as an error and nothing is
    /// cached; the cache never retries on its own.
    #[instrument(level = "debug", skip(self, settings), fields(context = settings.context))]
    pub async fn get_or_fetch(&self, reference: &str, settings: &TextSettings) -> Result<Arc<TextPayload>> {
        match self.get(reference, settings) {
            Ok(Some(payload)) => return Ok(payload),
            Ok(None) => {},
            Err(err) => tracing::debug!(error = ?err, "Falling back to a fetch"),
        }
        let request = self.request(reference, settings);
        let value = self
            .transport
            .get_json(&request)
            .await
            .or_raise(|| ErrorKind::Fetch(reference.to_string()))?;
        let payload: TextPayload =
            serde_json::from_value(value).or_raise(|| ErrorKind::InvalidPayload(reference.to_string()))?;
        let requested = CacheKey::new(&self.parser, reference, settings);
        Ok(self.store(payload, settings, Some(requested)))
    }

    /// Store a payload and every entry derived from it: one per segment of
    /// a section (recursively, for payloads above section level), a context
    /// entry per segment, and the section itself for a segment fetched with
    /// context.
    ///
    /// All entries become visible at once.
    pub fn save(&self, payload: TextPayload, settings: &TextSettings) -> Arc<TextPayload> {
        self.store(payload, settings, None)
    }

    fn store(&self, payload: TextPayload, settings: &TextSettings, alias: Option<CacheKey>) -> Arc<TextPayload> {
        let payload = Arc::new(payload);
        let mut batch = Batch::new();
        decompose(&self.parser, Arc::clone(&payload), settings, &mut batch);
        // Also answer the exact ref the caller asked for (an alternate title,
        // say) when the server canonicalized it.
        if let Some(alias) = alias.filter(|alias| *alias != batch[0].0) {
            batch.push((alias, CacheEntry::Resolved(Arc::clone(&payload))));
        }
        tracing::debug!(reference = %payload.reference, entries = batch.len(), "Saving text");
        self.apply(batch);
        if payload.is_spanning && self.prefetch_spanning {
            self.prefetch(&payload.spanning_refs, settings);
        }
        payload
    }

    fn apply(&self, batch: Batch) {
        let mut entries = self.write();
        for (key, entry) in batch {
            // A placeholder never replaces text that's already there.
            if entry.is_placeholder() && entries.get(&key).is_some_and(|existing| !existing.is_placeholder()) {
                continue;
            }
            entries.insert(key, entry);
        }
    }

    /// Replace the placeholder at `key` with `built`. Text saved since the
    /// placeholder was read wins, and a key cleared meanwhile stays empty.
    fn resolve_placeholder(&self, key: &CacheKey, built: Arc<TextPayload>) -> Arc<TextPayload> {
        let mut entries = self.write();
        match entries.get_mut(key) {
            Some(CacheEntry::Resolved(current)) => Arc::clone(current),
            Some(slot) => {
                *slot = CacheEntry::Resolved(Arc::clone(&built));
                built
            },
            None => built,
        }
    }

    fn build_context(&self, reference: &str, section_ref: &str, settings: &TextSettings) -> Result<Arc<TextPayload>> {
        let missing = || ErrorKind::MissingContext {
            segment: reference.to_string(),
            section: section_ref.to_string(),
        };
        let plain = settings.derived(false);
        let entries = self.read();
        let lookup = |reference: &str, settings: &TextSettings| {
            entries.get(&CacheKey::new(&self.parser, reference, settings)).and_then(CacheEntry::resolved).cloned()
        };
        let segment = lookup(reference, &plain).ok_or_raise(missing)?;
        let section = lookup(section_ref, &plain)
            .or_else(|| lookup(section_ref, &settings.derived(true)))
            .ok_or_raise(missing)?;
        Ok(Arc::new(TextPayload {
            text: section.text.clone(),
            he: section.he.clone(),
            ..TextPayload::clone(&segment)
        }))
    }

    fn prefetch(&self, refs: &[String], settings: &TextSettings) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(refs = refs.len(), "No runtime to prefetch spanned sections on");
            return;
        };
        let settings = settings.derived(true);
        for reference in refs {
            let cache = self.clone();
            let reference = reference.clone();
            let settings = settings.clone();
            runtime.spawn(async move {
                if let Err(err) = cache.get_or_fetch(&reference, &settings).await {
                    tracing::warn!(%reference, error = ?err, "Could not prefetch spanned section");
                }
            });
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Section sizes known from cached section payloads.
impl SectionLengths for TextCache {
    fn segment_count(&self, section_ref: &str) -> Option<u64> {
        let key = CacheKey::new(&self.parser, section_ref, &TextSettings::default());
        let entries = self.read();
        let section = entries.get(&key)?.resolved()?;
        (section.levels_up() == 1 && !section.is_range()).then(|| section.text.len().max(section.he.len()) as u64)
    }
}
