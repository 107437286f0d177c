use serde::{Deserialize, Serialize};

use super::{Link, Note, Sheet};

/// Everything related to one ref, as served by `/api/related`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelatedBundle {
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}
