//! Decomposition of a fetched payload into the cache entries it implies.
//!
//! Nothing here touches the cache: every entry is collected into a batch
//! that the cache applies under a single write lock, so readers never see a
//! half-decomposed payload.

use folio_refs::{RefParser, Section, hebrew_numeral};
use std::sync::Arc;

use crate::key::CacheKey;
use crate::models::{CacheEntry, TextPayload, TextSettings};

pub(crate) type Batch = Vec<(CacheKey, CacheEntry)>;

/// Where the children of a split payload hang.
struct Parent {
    reference: String,
    he_reference: String,
    sections: Vec<Section>,
    /// Section of the first child.
    start: Section,
    /// Section ref of the children, when they are segments.
    section_ref: Option<String>,
    /// Ref the last child's `next_segment` wraps into, if any.
    wrap_into: Option<String>,
}

impl Parent {
    fn delimiter(&self) -> &'static str {
        if self.sections.is_empty() { " " } else { ":" }
    }
}

/// Add `payload`, stored under `settings`, and everything derived from it
/// to `batch`.
pub(crate) fn decompose(parser: &RefParser, payload: Arc<TextPayload>, settings: &TextSettings, batch: &mut Batch) {
    batch.push((CacheKey::new(parser, &payload.reference, settings), CacheEntry::Resolved(Arc::clone(&payload))));
    let levels_up = payload.levels_up();
    if levels_up >= 1 && !payload.is_spanning {
        let parent = Parent {
            reference: payload.reference.clone(),
            he_reference: payload.he_ref.clone(),
            sections: payload.sections.clone(),
            start: Section::from(1),
            section_ref: match levels_up {
                1 => Some(payload.section_ref.clone().unwrap_or_else(|| payload.reference.clone())),
                _ => None,
            },
            wrap_into: payload.next.clone(),
        };
        split(parser, &payload, parent, settings, batch);
    } else if settings.context && levels_up <= 1 {
        if let Some(section) = section_copy(parser, &payload) {
            decompose(parser, Arc::new(section), &settings.derived(false), batch);
        }
    } else if levels_up == 0 && !payload.is_spanning && payload.is_range() {
        let Some((start, prefix)) = payload.sections.split_last() else {
            return;
        };
        let Some(section_ref) = section_ref_of(parser, &payload) else {
            return;
        };
        let parent = Parent {
            he_reference: he_section_ref_of(&payload),
            sections: prefix.to_vec(),
            start: start.clone(),
            section_ref: Some(section_ref.clone()),
            reference: section_ref,
            wrap_into: None,
        };
        split(parser, &payload, parent, settings, batch);
    }
}

fn split(parser: &RefParser, payload: &TextPayload, parent: Parent, settings: &TextSettings, batch: &mut Batch) {
    let len = payload.text.len().max(payload.he.len());
    let (text, he) = (payload.text.padded(len), payload.he.padded(len));
    let delimiter = parent.delimiter();
    let children_are_segments = parent.section_ref.is_some();

    let mut sections = Vec::with_capacity(len);
    let mut next = Some(parent.start.clone());
    while let Some(section) = next.take() {
        if sections.len() == len {
            break;
        }
        next = section.successor();
        sections.push(section);
    }
    let refs: Vec<String> = sections.iter().map(|s| format!("{}{delimiter}{s}", parent.reference)).collect();

    for (i, section) in sections.iter().enumerate() {
        let numeral = section.number().map_or_else(|| section.to_string(), hebrew_numeral);
        let next_segment = match refs.get(i + 1) {
            Some(next) => Some(next.clone()),
            None => parent.wrap_into.as_ref().map(|next| format!("{next}{delimiter}1")),
        };
        let prev_segment = i.checked_sub(1).map(|prev| refs[prev].clone());
        let mut child_sections = parent.sections.clone();
        child_sections.push(section.clone());

        let mut child = TextPayload {
            reference: refs[i].clone(),
            he_ref: format!("{}{delimiter}{numeral}", parent.he_reference),
            text: text[i].clone(),
            he: he[i].clone(),
            to_sections: child_sections.clone(),
            sections: child_sections,
            is_spanning: false,
            spanning_refs: Vec::new(),
            section_ref: parent.section_ref.clone(),
            he_section_ref: children_are_segments.then(|| parent.he_reference.clone()),
            next_segment,
            prev_segment,
            ..payload.clone()
        };
        if !children_are_segments {
            // A child section navigates between its siblings.
            child.section_ref = Some(child.reference.clone());
            child.he_section_ref = Some(child.he_ref.clone());
            child.next = child.next_segment.take();
            child.prev = child.prev_segment.take();
        }
        let reference = child.reference.clone();
        decompose(parser, Arc::new(child), &settings.derived(false), batch);
        if let Some(section_ref) = &parent.section_ref {
            batch.push((
                CacheKey::new(parser, &reference, &settings.derived(true)),
                CacheEntry::Placeholder { reference, section_ref: section_ref.clone() },
            ));
        }
    }
}

/// The payload re-addressed at its section, for a segment fetched with
/// context (whose text is the whole section).
fn section_copy(parser: &RefParser, payload: &TextPayload) -> Option<TextPayload> {
    let section_ref = section_ref_of(parser, payload)?;
    let depth = payload.sections.len().checked_sub(1)?;
    let he_section_ref = he_section_ref_of(payload);
    Some(TextPayload {
        reference: section_ref.clone(),
        he_ref: he_section_ref.clone(),
        sections: payload.sections[..depth].to_vec(),
        to_sections: payload.to_sections[..depth.min(payload.to_sections.len())].to_vec(),
        section_ref: Some(section_ref),
        he_section_ref: Some(he_section_ref),
        next_segment: None,
        prev_segment: None,
        ..payload.clone()
    })
}

fn section_ref_of(parser: &RefParser, payload: &TextPayload) -> Option<String> {
    payload.section_ref.clone().or_else(|| parser.section_ref(&payload.reference).ok())
}

fn he_section_ref_of(payload: &TextPayload) -> String {
    payload.he_section_ref.clone().unwrap_or_else(|| match payload.he_ref.rsplit_once(':') {
        Some((section, _)) => section.to_string(),
        None => payload.he_ref.clone(),
    })
}
