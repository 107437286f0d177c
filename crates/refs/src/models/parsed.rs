use serde::{Deserialize, Serialize};

use super::{Section, join};
use crate::error::{ErrorKind, Result};

/// The structured form of a ref.
///
/// `sections` runs from the most significant level to the least (chapter,
/// then verse). `to_sections` is the end of the range and always has the same
/// length as `sections`; for a single location the two are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRef {
    /// Longest known title that prefixes the ref.
    pub book: String,
    /// Root index the book belongs to. Differs from `book` for nodes of
    /// composite works.
    pub index: String,
    pub sections: Vec<Section>,
    pub to_sections: Vec<Section>,
    /// The cleaned input the ref was parsed from.
    #[serde(rename = "ref")]
    pub reference: String,
}

impl ParsedRef {
    /// A single location (not a range) in `book`.
    pub fn point(book: impl Into<String>, index: impl Into<String>, sections: Vec<Section>) -> Self {
        let book = book.into();
        let reference = render(&book, " ", ":", &sections, None);
        Self {
            book,
            index: index.into(),
            to_sections: sections.clone(),
            sections,
            reference,
        }
    }

    pub fn depth(&self) -> usize {
        self.sections.len()
    }

    pub fn is_range(&self) -> bool {
        self.sections != self.to_sections
    }

    /// Returns `true` if the range crosses a structural boundary, i.e. the
    /// start and end differ somewhere above the last level.
    pub fn is_spanning(&self) -> bool {
        self.divergence().is_some_and(|level| level + 1 < self.depth())
    }

    /// Index of the first level at which the range start and end differ.
    pub fn divergence(&self) -> Option<usize> {
        self.sections.iter().zip(&self.to_sections).position(|(from, to)| from != to)
    }

    /// The ref one level up: the last level of both ends is dropped.
    pub fn parent(&self) -> Option<Self> {
        if self.sections.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.sections.pop();
        parent.to_sections.pop();
        parent.reference = render(&parent.book, " ", ":", &parent.sections, parent.range_tail());
        Some(parent)
    }

    /// Canonical URL-safe form, e.g. `Genesis_Rabbah.1.4-6`.
    pub fn normal_form(&self) -> Result<String> {
        self.check()?;
        Ok(render(&self.book.replace(' ', "_"), ".", ".", &self.sections, self.range_tail()))
    }

    /// Human-readable form, e.g. `Genesis Rabbah 1:4-6`.
    pub fn display_form(&self) -> Result<String> {
        self.check()?;
        Ok(render(&self.book, " ", ":", &self.sections, self.range_tail()))
    }

    fn range_tail(&self) -> Option<&[Section]> {
        self.divergence().map(|level| &self.to_sections[level..])
    }

    fn check(&self) -> Result<()> {
        if self.book.is_empty() {
            exn::bail!(ErrorKind::Incomplete("book"));
        }
        if self.sections.len() != self.to_sections.len() {
            exn::bail!(ErrorKind::Incomplete("to_sections"));
        }
        Ok(())
    }
}

fn render(book: &str, book_separator: &str, separator: &str, sections: &[Section], tail: Option<&[Section]>) -> String {
    let mut out = book.to_string();
    if !sections.is_empty() {
        out.push_str(book_separator);
        out.push_str(&join(sections, separator));
    }
    if let Some(tail) = tail {
        out.push('-');
        out.push_str(&join(tail, separator));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(values: &[u64]) -> Vec<Section> {
        values.iter().copied().map(Section::from).collect()
    }

    fn range(book: &str, from: &[u64], to: &[u64]) -> ParsedRef {
        ParsedRef {
            book: book.to_string(),
            index: book.to_string(),
            sections: sections(from),
            to_sections: sections(to),
            reference: String::new(),
        }
    }

    #[test]
    fn test_forms_of_a_segment_range() {
        let parsed = range("Genesis Rabbah", &[1, 4], &[1, 6]);
        assert_eq!(parsed.normal_form().unwrap(), "Genesis_Rabbah.1.4-6");
        assert_eq!(parsed.display_form().unwrap(), "Genesis Rabbah 1:4-6");
        assert!(parsed.is_range());
        assert!(!parsed.is_spanning());
    }

    #[test]
    fn test_forms_of_a_spanning_range() {
        let parsed = range("Genesis", &[1, 31], &[2, 3]);
        assert_eq!(parsed.normal_form().unwrap(), "Genesis.1.31-2.3");
        assert_eq!(parsed.display_form().unwrap(), "Genesis 1:31-2:3");
        assert!(parsed.is_spanning());
    }

    #[test]
    fn test_book_only() {
        let parsed = range("Genesis", &[], &[]);
        assert_eq!(parsed.normal_form().unwrap(), "Genesis");
        assert!(parsed.parent().is_none());
    }

    #[test]
    fn test_incomplete_refs_do_not_render() {
        let no_book = range("", &[1], &[1]);
        assert_eq!(*no_book.normal_form().unwrap_err(), ErrorKind::Incomplete("book"));
        let mismatched = range("Genesis", &[1, 2], &[1]);
        assert_eq!(*mismatched.display_form().unwrap_err(), ErrorKind::Incomplete("to_sections"));
    }

    #[test]
    fn test_parent() {
        let parent = range("Genesis", &[1, 4], &[1, 6]).parent().unwrap();
        assert_eq!(parent.sections, sections(&[1]));
        assert!(!parent.is_range());
        assert_eq!(parent.reference, "Genesis 1");
    }
}
