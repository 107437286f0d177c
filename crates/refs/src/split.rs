//! Expansion of ranged refs into the individual refs they cover.

use std::collections::HashMap;

use crate::consts::MAX_EXPANSION;
use crate::error::Result;
use crate::models::{ParsedRef, Section};
use crate::parser::RefParser;

/// Source of section sizes, used to expand ranges that cross a section
/// boundary. Section refs are passed in display form.
pub trait SectionLengths {
    /// Number of segments in the section, if known.
    fn segment_count(&self, section_ref: &str) -> Option<u64>;
}

/// Nothing is known about any section.
impl SectionLengths for () {
    fn segment_count(&self, _section_ref: &str) -> Option<u64> {
        None
    }
}

impl SectionLengths for HashMap<String, u64> {
    fn segment_count(&self, section_ref: &str) -> Option<u64> {
        self.get(section_ref).copied()
    }
}

/// Sections from `from` to `to` inclusive, following [`Section::successor`].
fn run(from: &Section, to: &Section) -> Vec<Section> {
    let mut out = Vec::new();
    let mut next = Some(from.clone());
    while let Some(section) = next {
        if section > *to || out.len() >= MAX_EXPANSION {
            break;
        }
        next = section.successor();
        out.push(section);
    }
    out
}

fn point(parsed: &ParsedRef, prefix: &[Section], last: Section) -> String {
    let mut sections = prefix.to_vec();
    sections.push(last);
    ParsedRef::point(parsed.book.as_str(), parsed.index.as_str(), sections).reference
}

impl RefParser {
    /// Split a ranged ref into the display-form refs it covers.
    ///
    /// - A ref that isn't a range comes back alone, in display form.
    /// - A range within one section expands to every ref in it
    ///   (`Genesis 1:1-3` gives `Genesis 1:1`, `Genesis 1:2`, `Genesis 1:3`).
    /// - A range across sections expands section by section. Where `lengths`
    ///   doesn't know a section's size, the first section contributes only
    ///   the range start and middle sections contribute their section ref.
    ///   The last section is always fully expanded.
    /// - Anything deeper (a range diverging two or more levels above the
    ///   last) yields just its start and end refs.
    pub fn split_ranging(&self, reference: &str, lengths: &dyn SectionLengths) -> Result<Vec<String>> {
        let parsed = self.parse(reference)?;
        let Some(divergence) = parsed.divergence() else {
            return Ok(vec![parsed.display_form()?]);
        };
        let last = parsed.depth() - 1;
        let (from, to) = (&parsed.sections, &parsed.to_sections);
        let refs = if divergence == last {
            let prefix = &from[..last];
            run(&from[last], &to[last]).into_iter().map(|s| point(&parsed, prefix, s)).collect()
        } else if divergence + 1 == last {
            self.split_spanning(&parsed, lengths)
        } else {
            vec![point(&parsed, &from[..last], from[last].clone()), point(&parsed, &to[..last], to[last].clone())]
        };
        if refs.is_empty() {
            // Reversed or unorderable range.
            return Ok(vec![point(&parsed, &from[..last], from[last].clone())]);
        }
        Ok(refs)
    }

    fn split_spanning(&self, parsed: &ParsedRef, lengths: &dyn SectionLengths) -> Vec<String> {
        let last = parsed.depth() - 1;
        let level = last - 1;
        let (from, to) = (&parsed.sections, &parsed.to_sections);
        let prefix = &from[..level];
        let mut refs = Vec::new();
        for section in run(&from[level], &to[level]) {
            let section_prefix: Vec<Section> = prefix.iter().cloned().chain([section.clone()]).collect();
            let section_ref = ParsedRef::point(parsed.book.as_str(), parsed.index.as_str(), section_prefix.clone()).reference;
            let known = lengths.segment_count(&section_ref).map(Section::from);
            let (start, end) = if section == from[level] {
                match known {
                    Some(end) => (from[last].clone(), end),
                    None => (from[last].clone(), from[last].clone()),
                }
            } else if section == to[level] {
                (Section::from(1), to[last].clone())
            } else {
                match known {
                    Some(end) => (Section::from(1), end),
                    None => {
                        refs.push(section_ref);
                        continue;
                    },
                }
            };
            refs.extend(run(&start, &end).into_iter().map(|s| point(parsed, &section_prefix, s)));
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TitleIndex;
    use rstest::rstest;

    fn parser() -> RefParser {
        RefParser::new(TitleIndex::with_titles(["Genesis", "Berakhot", "Zohar"]))
    }

    #[rstest]
    #[case("Genesis 1:1-1:3", &["Genesis 1:1", "Genesis 1:2", "Genesis 1:3"])]
    #[case("Genesis 1:4-6", &["Genesis 1:4", "Genesis 1:5", "Genesis 1:6"])]
    #[case("Genesis 1:4", &["Genesis 1:4"])]
    #[case("Genesis.1.4", &["Genesis 1:4"])]
    #[case("Genesis 1-3", &["Genesis 1", "Genesis 2", "Genesis 3"])]
    #[case("Berakhot 2a-3a", &["Berakhot 2a", "Berakhot 2b", "Berakhot 3a"])]
    #[case("Genesis 1:6-4", &["Genesis 1:6"])]
    fn test_split_within_section(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(parser().split_ranging(input, &()).unwrap(), expected);
    }

    #[test]
    fn test_split_spanning_without_lengths() {
        let refs = parser().split_ranging("Genesis 1:30-3:2", &()).unwrap();
        assert_eq!(refs, ["Genesis 1:30", "Genesis 2", "Genesis 3:1", "Genesis 3:2"]);
    }

    #[test]
    fn test_split_spanning_with_lengths() {
        let lengths: HashMap<String, u64> = HashMap::from([("Genesis 1".to_string(), 31), ("Genesis 2".to_string(), 2)]);
        let refs = parser().split_ranging("Genesis 1:30-3:1", &lengths).unwrap();
        assert_eq!(refs, ["Genesis 1:30", "Genesis 1:31", "Genesis 2:1", "Genesis 2:2", "Genesis 3:1"]);
    }

    #[test]
    fn test_split_stops_at_largest_section() {
        let refs = parser().split_ranging("Genesis 1:18446744073709551614-18446744073709551615", &()).unwrap();
        assert_eq!(refs, ["Genesis 1:18446744073709551614", "Genesis 1:18446744073709551615"]);
    }

    #[test]
    fn test_split_deep_range_keeps_endpoints() {
        let refs = parser().split_ranging("Zohar 1:2:3-2:1:1", &()).unwrap();
        assert_eq!(refs, ["Zohar 1:2:3", "Zohar 2:1:1"]);
    }

    #[test]
    fn test_split_unknown_book() {
        assert!(parser().split_ranging("Nowhere 1:1-3", &()).is_err());
    }
}
