use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ErrorKind, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub titles: TitlesConfig,
    pub log: LogConfig,
}

impl Config {
    /// Check values the schema alone can't.
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            exn::bail!(ErrorKind::Invalid { field: "api.base_url", reason: "must be an http(s) URL" });
        }
        if self.api.connect_timeout_ms == 0 {
            exn::bail!(ErrorKind::Invalid { field: "api.connect_timeout_ms", reason: "must be positive" });
        }
        if self.api.request_timeout_ms == 0 {
            exn::bail!(ErrorKind::Invalid { field: "api.request_timeout_ms", reason: "must be positive" });
        }
        if self.log.filter.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid { field: "log.filter", reason: "must not be empty" });
        }
        Ok(())
    }
}

/// Where and how to reach the texts API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Sent as the `User-Agent` header; a `folio/<version>` agent when unset.
    pub user_agent: Option<String>,
}

impl ApiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.sefaria.org".to_string(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Fetch the sections a spanning text covers in the background.
    pub prefetch_spanning: bool,
    /// Default for the `wrapLinks` text request flag.
    pub wrap_links: bool,
    /// Include the user's private notes.
    pub private_notes: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { prefetch_spanning: true, wrap_links: false, private_notes: false }
    }
}

/// Source of the known book titles. Without a path, titles are fetched
/// from the API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TitlesConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directives, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "warn".to_string() }
    }
}
