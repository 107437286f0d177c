use serde::{Deserialize, Serialize};

/// Text in one language: a single segment, or the ordered children of a
/// section (which are themselves sections for payloads more than one level
/// above segments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextContent {
    Segment(String),
    Segments(Vec<TextContent>),
}

impl TextContent {
    /// Number of children; a lone segment counts as one.
    pub fn len(&self) -> usize {
        match self {
            Self::Segment(_) => 1,
            Self::Segments(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The children, padded with empty segments up to `len`. Never truncates.
    pub fn padded(&self, len: usize) -> Vec<TextContent> {
        let mut children = match self {
            Self::Segment(text) => vec![Self::Segment(text.clone())],
            Self::Segments(children) => children.clone(),
        };
        if children.len() < len {
            children.resize(len, Self::default());
        }
        children
    }

    /// The segment text, if this is a single segment.
    pub fn as_segment(&self) -> Option<&str> {
        match self {
            Self::Segment(text) => Some(text),
            Self::Segments(_) => None,
        }
    }
}

impl Default for TextContent {
    fn default() -> Self {
        Self::Segment(String::new())
    }
}

impl From<&str> for TextContent {
    fn from(text: &str) -> Self {
        Self::Segment(text.to_string())
    }
}

impl<T: Into<TextContent>> From<Vec<T>> for TextContent {
    fn from(children: Vec<T>) -> Self {
        Self::Segments(children.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_nested() {
        let content: TextContent = serde_json::from_value(json!([["a", "b"], ["c"]])).unwrap();
        assert_eq!(content, TextContent::from(vec![vec!["a", "b"], vec!["c"]]));
        assert_eq!(content.len(), 2);
    }

    #[test]
    fn test_pad_never_truncates() {
        let content = TextContent::from(vec!["a", "b", "c"]);
        assert_eq!(content.padded(2).len(), 3);
        assert_eq!(content.padded(5)[4], TextContent::default());
        assert_eq!(TextContent::from("only").padded(2), vec![TextContent::from("only"), TextContent::from("")]);
    }
}
