use std::fmt;

/// A GET request against the API, relative to the transport's base URL.
///
/// The [`Display`](fmt::Display) form (`/api/texts/Genesis.1?context=1`) is
/// the request's identity: two requests that render the same are the same
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiRequest {
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    /// A request for the given path segments, with no query.
    ///
    /// Segments are escaped when the URL is built, so a ref like
    /// `Genesis 1:1` can be passed as a single segment.
    pub fn new(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Adds a `0`/`1` query flag.
    pub fn with_flag(self, key: impl Into<String>, on: bool) -> Self {
        self.with_query(key, if on { "1" } else { "0" })
    }

    /// The path part of the display form, without the query.
    pub fn path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())?;
        for (position, (key, value)) in self.query.iter().enumerate() {
            let separator = if position == 0 { '?' } else { '&' };
            write!(f, "{separator}{key}={value}")?;
        }
        Ok(())
    }
}
