use std::sync::Arc;

use super::TextPayload;

/// What the cache holds under a key.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    /// A payload, fetched or derived from a fetched one.
    Resolved(Arc<TextPayload>),
    /// A segment in context, to be assembled from the cached segment and
    /// the cached text of its section.
    Placeholder {
        reference: String,
        section_ref: String,
    },
}

impl CacheEntry {
    pub fn resolved(&self) -> Option<&Arc<TextPayload>> {
        match self {
            Self::Resolved(payload) => Some(payload),
            Self::Placeholder { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}
