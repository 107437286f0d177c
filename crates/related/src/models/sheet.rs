use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Anchored;

/// A source sheet that quotes a ref.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub anchor_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchor_ref_expanded: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Anchored for Sheet {
    fn anchor_ref(&self) -> &str {
        &self.anchor_ref
    }

    fn anchor_ref_expanded(&self) -> &[String] {
        &self.anchor_ref_expanded
    }
}
