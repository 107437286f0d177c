//! Ref parsing and formatting.

use dashmap::DashMap;
use std::iter::once;
use tracing::instrument;

use crate::consts::{SECTION_REGEX, SECTIONS_REGEX};
use crate::error::{ErrorKind, Result};
use crate::index::TitleIndex;
use crate::models::{ParsedRef, Section};

type Memo = DashMap<String, std::result::Result<ParsedRef, ErrorKind>>;

/// Parses refs against a fixed set of known titles.
///
/// Every parse (failures included) is memoized on the cleaned input for the
/// lifetime of the parser. Returned values are clones; mutate freely.
///
/// # Examples
///
/// ```
/// use folio_refs::{RefParser, Section, TitleIndex};
///
/// let parser = RefParser::new(TitleIndex::with_titles(["Genesis"]));
/// let parsed = parser.parse("Genesis 1:4-6").unwrap();
/// assert_eq!(parsed.book, "Genesis");
/// assert_eq!(parsed.sections, vec![Section::from(1), Section::from(4)]);
/// assert_eq!(parsed.to_sections, vec![Section::from(1), Section::from(6)]);
///
/// assert_eq!(parser.normalize("Genesis 1:4-6"), "Genesis.1.4-6");
/// assert_eq!(parser.humanize("genesis.1.4-6"), "Genesis 1:4-6");
/// ```
#[derive(Debug, Default)]
pub struct RefParser {
    index: TitleIndex,
    memo: Memo,
}

impl RefParser {
    pub fn new(index: TitleIndex) -> Self {
        Self { index, memo: Memo::new() }
    }

    pub fn index(&self) -> &TitleIndex {
        &self.index
    }

    /// Forget every memoized parse.
    pub fn clear(&self) {
        self.memo.clear();
    }

    /// Parse a free-form ref.
    ///
    /// Underscores, periods and colons are read as spaces, runs of spaces
    /// collapse, and the first letter is capitalized. Book matching is
    /// otherwise case-sensitive; see the name lookup in the client for
    /// repairing miscapitalized input.
    #[instrument(level = "trace", skip(self))]
    pub fn parse(&self, input: &str) -> Result<ParsedRef> {
        let cleaned = clean(input);
        if let Some(memoized) = self.memo.get(&cleaned) {
            return memoized.value().clone().map_err(exn::Exn::from);
        }
        let parsed = self.parse_cleaned(&cleaned);
        self.memo.insert(cleaned, parsed.clone());
        parsed.map_err(exn::Exn::from)
    }

    fn parse_cleaned(&self, cleaned: &str) -> std::result::Result<ParsedRef, ErrorKind> {
        if cleaned.is_empty() {
            return Err(ErrorKind::Empty);
        }
        let (main, range_end) = match cleaned.split_once('-') {
            Some((main, end)) => (main.trim(), Some(end.trim())),
            None => (cleaned, None),
        };
        let (book, numbers) = self.longest_book(main).ok_or_else(|| ErrorKind::UnknownBook(main.to_string()))?;
        if !numbers.is_empty() && !SECTIONS_REGEX.is_match(numbers) {
            return Err(ErrorKind::BadSection(numbers.to_string()));
        }
        let sections: Vec<Section> = numbers.split(' ').filter(|s| !s.is_empty()).map(Section::from).collect();
        let mut to_sections = sections.clone();
        if let Some(end) = range_end {
            let tokens: Vec<&str> = end.split(' ').filter(|s| !s.is_empty()).collect();
            if tokens.is_empty() || tokens.len() > sections.len() || !tokens.iter().all(|t| SECTION_REGEX.is_match(t)) {
                return Err(ErrorKind::BadRange(end.to_string()));
            }
            // A shorter range end only replaces the least significant levels.
            let offset = sections.len() - tokens.len();
            for (level, token) in tokens.into_iter().enumerate() {
                to_sections[offset + level] = Section::from(token);
            }
        }
        Ok(ParsedRef {
            index: self.root_index(book).to_string(),
            book: book.to_string(),
            sections,
            to_sections,
            reference: cleaned.to_string(),
        })
    }

    /// Longest known title that prefixes `main` on a word boundary, and the
    /// remaining section string.
    fn longest_book<'a>(&self, main: &'a str) -> Option<(&'a str, &'a str)> {
        let ends: Vec<usize> = main.match_indices(' ').map(|(i, _)| i).chain(once(main.len())).collect();
        ends.into_iter().rev().find_map(|end| {
            let candidate = &main[..end];
            self.index.contains_book(candidate).then(|| (candidate, main[end..].trim()))
        })
    }

    /// Longest prefix of `book` naming a root index; the book itself when no
    /// index record matches.
    fn root_index<'a>(&self, book: &'a str) -> &'a str {
        book.char_indices()
            .map(|(i, _)| i)
            .filter(|&i| i > 0)
            .chain(once(book.len()))
            .rev()
            .map(|end| &book[..end])
            .find(|prefix| self.index.index(prefix).is_some())
            .unwrap_or(book)
    }

    /// Render a structured ref in its canonical URL-safe form.
    pub fn format(&self, parsed: &ParsedRef) -> Result<String> {
        parsed.normal_form()
    }

    /// Canonical form of a ref (`Genesis 1:4` becomes `Genesis.1.4`).
    ///
    /// Refs that fail to parse are returned unchanged.
    pub fn normalize(&self, reference: &str) -> String {
        self.parse(reference)
            .and_then(|parsed| parsed.normal_form())
            .unwrap_or_else(|_| reference.to_string())
    }

    /// Collapse a list of consecutive refs into one range in display form,
    /// from the start of the first to the end of the last.
    ///
    /// Ranges across books (or across nodes of a composite work) are not
    /// supported: the first ref is returned unchanged.
    pub fn normalize_list(&self, refs: &[impl AsRef<str>]) -> String {
        let (Some(first), Some(last)) = (refs.first(), refs.last()) else {
            return String::new();
        };
        let (first, last) = (first.as_ref(), last.as_ref());
        if refs.len() == 1 {
            return first.to_string();
        }
        let (Ok(start), Ok(end)) = (self.parse(first), self.parse(last)) else {
            return first.to_string();
        };
        if start.book != end.book || start.depth() != end.depth() {
            return first.to_string();
        }
        let merged = ParsedRef { to_sections: end.to_sections, ..start };
        merged.display_form().unwrap_or_else(|_| first.to_string())
    }

    /// Display form of a ref (`Genesis.1.4` becomes `Genesis 1:4`).
    ///
    /// Refs that fail to parse are returned unchanged.
    pub fn humanize(&self, reference: &str) -> String {
        self.parse(reference)
            .and_then(|parsed| parsed.display_form())
            .unwrap_or_else(|_| reference.to_string())
    }

    /// Case-insensitive key for a ref, used by every ref-keyed cache.
    ///
    /// Refs that fail to parse are keyed on their cleaned form, so separator
    /// and case variants of an unknown ref still share a key.
    pub fn cache_key(&self, reference: &str) -> String {
        self.parse(reference)
            .and_then(|parsed| parsed.display_form())
            .unwrap_or_else(|_| clean(reference))
            .to_lowercase()
    }

    /// Display form of the ref one level up (`Genesis 1:4` becomes `Genesis 1`).
    pub fn section_ref(&self, reference: &str) -> Result<String> {
        let parsed = self.parse(reference)?;
        match parsed.parent() {
            Some(parent) => parent.display_form(),
            None => exn::bail!(ErrorKind::Incomplete("sections")),
        }
    }

    /// Returns `true` if the span of `inner` lies within the span of `outer`.
    pub fn contains(&self, outer: &str, inner: &str) -> Result<bool> {
        let outer = self.parse(outer)?;
        let inner = self.parse(inner)?;
        if outer.book != inner.book {
            return Ok(false);
        }
        let depth = outer.depth().min(inner.depth());
        Ok(outer.sections[..depth] <= inner.sections[..depth] && inner.to_sections[..depth] <= outer.to_sections[..depth])
    }
}

fn clean(input: &str) -> String {
    let spaced: String = input
        .chars()
        .map(|c| match c {
            '_' | '.' | ':' => ' ',
            c => c,
        })
        .collect();
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
