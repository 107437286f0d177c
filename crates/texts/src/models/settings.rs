/// Request options for a text. Each is independent; see [`Default`] for
/// the defaults.
///
/// Only `context`, `version` and `language` distinguish cache entries. The
/// remaining flags shape the request but not the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextSettings {
    pub commentary: bool,
    /// Return the whole surrounding section along with a segment.
    pub context: bool,
    /// Pad short refs up to section level.
    pub pad: bool,
    pub version: Option<String>,
    pub language: Option<String>,
    pub wrap_links: bool,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            commentary: false,
            context: false,
            pad: true,
            version: None,
            language: None,
            wrap_links: false,
        }
    }
}

impl TextSettings {
    pub fn with_context(mut self, context: bool) -> Self {
        self.context = context;
        self
    }

    pub fn with_version(mut self, language: impl Into<String>, version: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self.version = Some(version.into());
        self
    }

    /// Settings for entries derived from a payload fetched with `self`:
    /// the same version and language, everything else default.
    pub(crate) fn derived(&self, context: bool) -> Self {
        Self {
            version: self.version.clone(),
            language: self.language.clone(),
            ..Self::default()
        }
        .with_context(context)
    }

    /// Language and version, when both are set.
    pub(crate) fn version_pair(&self) -> Option<(&str, &str)> {
        self.language.as_deref().zip(self.version.as_deref())
    }
}
