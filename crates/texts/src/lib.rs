//! Cache of text payloads keyed by ref, version, language and context.
//!
//! A fetched section is stored whole and also split into one entry per
//! segment, so later lookups of any segment in it (with or without context)
//! are answered without another request.

mod cache;
pub mod error;
mod key;
pub mod models;
mod split;

pub use crate::cache::TextCache;
pub use crate::key::CacheKey;
pub use crate::models::{CacheEntry, TextContent, TextPayload, TextSettings};
