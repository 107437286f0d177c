use folio_refs::Section;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::TextContent;

/// A text unit as served by `/api/texts`: a segment, a section, or a range
/// of either, in two languages.
///
/// Fields the cache doesn't interpret (version metadata, commentary, ...)
/// are kept in `extra` and survive splitting and re-serialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPayload {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub he_ref: String,
    #[serde(default)]
    pub book: String,
    #[serde(default)]
    pub text: TextContent,
    #[serde(default)]
    pub he: TextContent,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub to_sections: Vec<Section>,
    /// Nesting depth of the whole work (2 for chapter and verse).
    #[serde(default)]
    pub text_depth: usize,
    /// The range crosses a section boundary.
    #[serde(default)]
    pub is_spanning: bool,
    /// Section refs covered by a spanning payload, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spanning_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub he_section_ref: Option<String>,
    /// Next section of the work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Previous section of the work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_segment: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextPayload {
    /// How many levels above a single segment this payload sits.
    pub fn levels_up(&self) -> usize {
        self.text_depth.saturating_sub(self.sections.len())
    }

    pub fn is_range(&self) -> bool {
        self.sections != self.to_sections
    }
}
