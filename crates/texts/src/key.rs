use folio_refs::RefParser;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::TextSettings;

const CONTEXT_SUFFIX: &str = "|CONTEXT";

/// Key of a text cache entry.
///
/// Built from the ref's display form, lower-cased, so `Genesis.1`,
/// `genesis 1` and `Genesis 1` share an entry. A `/language/version` suffix
/// is added when both are set, and `|CONTEXT` when context is requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(parser: &RefParser, reference: &str, settings: &TextSettings) -> Self {
        let mut key = parser.cache_key(reference);
        if let Some((language, version)) = settings.version_pair() {
            key.push('/');
            key.push_str(language);
            key.push('/');
            key.push_str(version);
        }
        if settings.context {
            key.push_str(CONTEXT_SUFFIX);
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
