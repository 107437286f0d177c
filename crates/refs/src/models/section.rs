use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// One level of a ref's location, e.g. the `1` or the `4` in `Genesis 1:4`.
///
/// Usually a plain number, but paginated works address pages by folio and
/// side (`2a`, `2b`), so sections are kept as text. Sections order
/// numerically, with `a` before `b` on the same folio.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Section(String);

impl Section {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The section as a plain number, if it is one.
    pub fn number(&self) -> Option<u64> {
        if self.0.bytes().all(|b| b.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }

    /// The section that immediately follows this one.
    ///
    /// Numbers count up by one; folio sides go `2a`, `2b`, `3a`. Anything
    /// else has no known successor.
    pub fn successor(&self) -> Option<Self> {
        if let Some(number) = self.number() {
            return number.checked_add(1).map(Self::from);
        }
        if let Some(folio) = self.0.strip_suffix('a') {
            let folio: u64 = folio.parse().ok()?;
            return Some(Self(format!("{folio}b")));
        }
        let folio: u64 = self.0.strip_suffix('b')?.parse().ok()?;
        Some(Self(format!("{}a", folio.checked_add(1)?)))
    }

    fn sort_key(&self) -> (u64, u8) {
        let digits = self.0.bytes().take_while(u8::is_ascii_digit).count();
        let Ok(number) = self.0[..digits].parse::<u64>() else {
            return (u64::MAX, u8::MAX);
        };
        let side = match &self.0[digits..] {
            "" => 0,
            "a" => 1,
            "b" => 2,
            _ => u8::MAX,
        };
        (number, side)
    }
}

impl From<u64> for Section {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}
impl From<&str> for Section {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
impl From<String> for Section {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl Ord for Section {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key()).then_with(|| self.0.cmp(&other.0))
    }
}
impl PartialOrd for Section {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// The texts API sends sections as numbers for most works and as strings for
// paginated ones; both are accepted, and numbers are written back as numbers.
impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.number() {
            Some(number) => serializer.serialize_u64(number),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(number) => Self::from(number),
            Raw::Text(text) => Self(text),
        })
    }
}
