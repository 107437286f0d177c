use folio_refs::{RefParser, SectionLengths};
use std::collections::HashMap;

use crate::models::Anchored;

/// Group items under every individual ref they anchor to.
///
/// An item's refs are its server-expanded anchor refs if it has them, and
/// otherwise its anchor ref split with [`RefParser::split_ranging`] (falling
/// back to the anchor ref itself when that fails). Items without an anchor
/// are skipped. Keys are display-form refs; within a bucket, items keep
/// their input order.
pub fn bucket_by_ref<T: Anchored + Clone>(
    parser: &RefParser,
    lengths: &dyn SectionLengths,
    items: &[T],
) -> HashMap<String, Vec<T>> {
    let mut buckets: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        let anchor = item.anchor_ref();
        if anchor.is_empty() {
            continue;
        }
        let mut refs = match item.anchor_ref_expanded() {
            [] => parser.split_ranging(anchor, lengths).unwrap_or_else(|_| vec![anchor.to_string()]),
            expanded => expanded.iter().map(|r| parser.humanize(r)).collect(),
        };
        refs.dedup();
        for reference in refs {
            buckets.entry(reference).or_default().push(item.clone());
        }
    }
    buckets
}
