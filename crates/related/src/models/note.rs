use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Anchored;

/// A user's note on a ref.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub anchor_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchor_ref_expanded: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Anchored for Note {
    fn anchor_ref(&self) -> &str {
        &self.anchor_ref
    }

    fn anchor_ref_expanded(&self) -> &[String] {
        &self.anchor_ref_expanded
    }
}
