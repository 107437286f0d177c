//! Known titles and index records.
//!
//! The parser needs two lookups: "is this string a book title" (any title a
//! ref may start with, including alternate titles and nodes of composite
//! works) and "is this string the title of a root index" (used to resolve a
//! book to the work it belongs to).

use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{ErrorKind, Result};

/// Pseudo-book for source sheets (`Sheet 42`); always known.
pub const SHEET_BOOK: &str = "Sheet";

const COMMENTARY: &str = "Commentary";

/// A root index record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, alias = "primaryCategory")]
    pub primary_category: Option<String>,
}

impl IndexEntry {
    pub fn new(title: impl Into<String>, categories: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            title: title.into(),
            categories: categories.into_iter().map(Into::into).collect(),
            primary_category: None,
        }
    }

    pub fn is_commentary(&self) -> bool {
        self.categories.first().is_some_and(|c| c == COMMENTARY) || self.primary_category.as_deref() == Some(COMMENTARY)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TitleRecord {
    Title(String),
    Index(IndexEntry),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TitlesDocument {
    Books { books: Vec<TitleRecord> },
    Records(Vec<TitleRecord>),
}

/// Lookup tables of known book titles and root indexes.
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    books: HashSet<String>,
    indexes: HashMap<String, IndexEntry>,
}

impl TitleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index of plain book titles (no index records).
    pub fn with_titles(titles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut index = Self::new();
        for title in titles {
            index.add_book(title);
        }
        index
    }

    /// Read a titles document.
    ///
    /// Accepts the `/api/index/titles` shape (`{"books": [...]}`) or a bare
    /// array. Each record is either a title string or an index record
    /// object (`{"title": ..., "categories": [...]}`); index records are
    /// registered as books too.
    pub fn from_json(json: &[u8]) -> Result<Self> {
        let document: TitlesDocument = serde_json::from_slice(json).or_raise(|| ErrorKind::InvalidIndex)?;
        Ok(Self::from_document(document))
    }

    /// Like [`TitleIndex::from_json`], for an already decoded document.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let document: TitlesDocument = serde_json::from_value(value).or_raise(|| ErrorKind::InvalidIndex)?;
        Ok(Self::from_document(document))
    }

    fn from_document(document: TitlesDocument) -> Self {
        let records = match document {
            TitlesDocument::Books { books } => books,
            TitlesDocument::Records(records) => records,
        };
        let mut index = Self::new();
        for record in records {
            match record {
                TitleRecord::Title(title) => index.add_book(title),
                TitleRecord::Index(entry) => index.add_index(entry),
            }
        }
        index
    }

    pub fn add_book(&mut self, title: impl Into<String>) {
        self.books.insert(title.into());
    }

    pub fn add_index(&mut self, entry: IndexEntry) {
        self.books.insert(entry.title.clone());
        self.indexes.insert(entry.title.clone(), entry);
    }

    pub fn contains_book(&self, title: &str) -> bool {
        title == SHEET_BOOK || self.books.contains(title)
    }

    pub fn index(&self, title: &str) -> Option<&IndexEntry> {
        self.indexes.get(title)
    }

    pub fn is_commentary(&self, title: &str) -> bool {
        self.index(title).is_some_and(IndexEntry::is_commentary)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
