//! Caches of items that anchor to refs: links between texts, notes and
//! source sheets.
//!
//! Every fetched list is kept under the ref it was fetched for and also
//! bucketed under each individual ref its items cover, so a later lookup of
//! any of those refs needs no request.

mod bucket;
mod cache;
pub mod error;
mod filter;
pub mod models;
mod store;

pub use crate::bucket::bucket_by_ref;
pub use crate::cache::RelatedCache;
pub use crate::filter::{LinkFilter, filter_links};
pub use crate::models::{Anchored, CollectiveTitle, Link, Note, RelatedBundle, Sheet};
pub use crate::store::ItemStore;
