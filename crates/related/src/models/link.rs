use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Anchored;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollectiveTitle {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub he: String,
}

/// A connection from a ref in one text to a ref in another.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default)]
    pub anchor_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchor_ref_expanded: Vec<String>,
    /// The other end of the link.
    #[serde(default)]
    pub source_ref: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub collective_title: CollectiveTitle,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Anchored for Link {
    fn anchor_ref(&self) -> &str {
        &self.anchor_ref
    }

    fn anchor_ref_expanded(&self) -> &[String] {
        &self.anchor_ref_expanded
    }
}
