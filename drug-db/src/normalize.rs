//! Language-aware name normalization and matching.
//!
//! Names containing a CJK unified ideograph are used verbatim; every other
//! name is compared case-insensitively.

/// `true` if `s` contains a CJK unified ideograph (U+4E00..=U+9FFF).
pub fn is_chinese(s: &str) -> bool {
    s.chars().any(|ch| ('\u{4e00}'..='\u{9fff}').contains(&ch))
}

/// Index key for a name: unchanged for Chinese names, lowercased otherwise.
pub fn index_key(name: &str) -> String {
    if is_chinese(name) {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

/// Text prepared once for matching many names against it.
pub(crate) struct Haystack<'a> {
    raw: &'a str,
    lower: String,
}

impl<'a> Haystack<'a> {
    pub(crate) fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lower: raw.to_lowercase(),
        }
    }

    /// Chinese names: plain substring. Others: case-insensitive substring.
    pub(crate) fn mentions(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        if is_chinese(name) {
            self.raw.contains(name)
        } else {
            self.lower.contains(&name.to_lowercase())
        }
    }
}
