use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Digits with an optional amud suffix (`2a`, `2b`) for paginated works.
const SECTION: &str = r"\d+[ab]?";

regex!(SECTION_REGEX, format!("^{SECTION}$").as_str());
regex!(SECTIONS_REGEX, format!("^{SECTION}(?: {SECTION})*$").as_str());

/// Upper bound on refs produced when expanding a single range.
pub(crate) const MAX_EXPANSION: usize = 10_000;
