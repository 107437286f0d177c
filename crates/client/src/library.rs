use std::sync::Arc;

use exn::{OptionExt, ResultExt};
use folio_config::{CacheConfig, Config};
use folio_refs::{ParsedRef, RefParser, TitleIndex};
use folio_related::RelatedCache;
use folio_texts::{TextCache, TextSettings};
use folio_transport::TransportHandle;
use folio_transport::backend::{HttpOptions, HttpTransport};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::names::NameCache;
use crate::titles::load_titles;

/// Everything a client needs, sharing one parser and one transport: the
/// text cache, the related data cache and name lookups.
///
/// Clones share their caches.
#[derive(Clone)]
pub struct Library {
    parser: Arc<RefParser>,
    texts: TextCache,
    related: RelatedCache,
    names: NameCache,
    settings: TextSettings,
}

impl Library {
    pub fn new(index: TitleIndex, transport: TransportHandle) -> Self {
        Self::with_cache_config(index, transport, &CacheConfig::default())
    }

    pub fn with_cache_config(index: TitleIndex, transport: TransportHandle, config: &CacheConfig) -> Self {
        let parser = Arc::new(RefParser::new(index));
        let texts = TextCache::new(Arc::clone(&parser), Arc::clone(&transport))
            .with_prefetch_spanning(config.prefetch_spanning);
        let related = RelatedCache::new(Arc::clone(&parser), Arc::clone(&transport))
            .with_section_lengths(Arc::new(texts.clone()))
            .with_private(config.private_notes);
        let names = NameCache::new(transport);
        let settings = TextSettings { wrap_links: config.wrap_links, ..TextSettings::default() };
        Self { parser, texts, related, names, settings }
    }

    /// Build an HTTP-backed library from configuration, loading the known
    /// titles first.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let api = &config.api;
        let mut options =
            HttpOptions { connect_timeout: api.connect_timeout(), request_timeout: api.request_timeout(), ..HttpOptions::default() };
        if let Some(user_agent) = &api.user_agent {
            options.user_agent = user_agent.clone();
        }
        let http = HttpTransport::new(&api.base_url, &options).or_raise(|| ErrorKind::Transport)?;
        let transport: TransportHandle = Arc::new(http);
        let index = load_titles(transport.as_ref(), &config.titles).await?;
        Ok(Self::with_cache_config(index, transport, &config.cache))
    }

    pub fn parser(&self) -> &RefParser {
        &self.parser
    }

    pub fn texts(&self) -> &TextCache {
        &self.texts
    }

    pub fn related(&self) -> &RelatedCache {
        &self.related
    }

    pub fn names(&self) -> &NameCache {
        &self.names
    }

    /// Default settings for text requests.
    pub fn text_settings(&self) -> TextSettings {
        self.settings.clone()
    }

    /// Drop every cached text, related item, name response and parse.
    pub fn reset(&self) {
        self.texts.clear();
        self.related.clear();
        self.names.clear();
        self.parser.clear();
        tracing::debug!("Library caches cleared");
    }

    /// Parse a ref typed by a user. When it doesn't parse as written, the
    /// name API is asked about it: a ref it recognizes is used as is, and a
    /// query that only differs from a known title by capitalization is
    /// repaired (`GENESIS 1:1` becomes `Genesis 1:1`).
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve_ref(&self, query: &str) -> Result<ParsedRef> {
        match self.parser.parse(query) {
            Ok(parsed) => return Ok(parsed),
            Err(err) => tracing::debug!(error = %*err, "Not a ref as written"),
        }
        let response = self.names.lookup(query, false).await?;
        let candidate = match (&response.reference, response.is_ref) {
            (Some(reference), true) => reference.clone(),
            _ => response.repair(query).ok_or_raise(|| ErrorKind::NotARef(query.to_string()))?,
        };
        tracing::debug!(%candidate, "Resolved through name lookup");
        self.parser.parse(&candidate).or_raise(|| ErrorKind::NotARef(query.to_string()))
    }
}
