//! Forbidden substrings that must never appear in an issued identifier.

use serde::{Deserialize, Serialize};

/// Words skipped by default. None contain `I`, which the default alphabet
/// lacks.
pub const DEFAULT_FORBIDDEN_WORDS: &[&str] = &["FUCK", "CUNT", "FART", "TURD", "TWAT", "BALLS"];

/// Additional words for alphabets that contain `I`.
pub const I_FORBIDDEN_WORDS: &[&str] = &["SHIT", "TIT", "PISS"];

/// An ordered list of forbidden substrings, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ForbiddenWords {
    words: Vec<String>,
}

impl ForbiddenWords {
    /// Creates a list from the given words. Empty entries are dropped.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_uppercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// An empty list; no remediation takes place.
    pub fn none() -> Self {
        Self { words: Vec::new() }
    }

    /// Returns a copy of this list with `more` appended.
    #[must_use]
    pub fn extended<I, S>(&self, more: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = self.words.clone();
        words.extend(Self::new(more).words);
        Self { words }
    }

    /// The words, uppercased, in scan order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Finds the first listed word that occurs in `text`.
    ///
    /// Returns the half-open span `(start, end)` of its first occurrence,
    /// in chars.
    pub fn find_first(&self, text: &str) -> Option<(usize, usize)> {
        // Fold like the word list, remembering which source char each folded
        // char came from so spans index the original text.
        let mut haystack = Vec::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        for (i, c) in text.chars().enumerate() {
            for folded in c.to_uppercase() {
                haystack.push(folded);
                origin.push(i);
            }
        }

        self.words.iter().find_map(|word| {
            let needle: Vec<char> = word.chars().collect();
            haystack
                .windows(needle.len())
                .position(|window| window == needle.as_slice())
                .map(|start| (origin[start], origin[start + needle.len() - 1] + 1))
        })
    }

    /// Returns true if any listed word occurs in `text`.
    pub fn is_found_in(&self, text: &str) -> bool {
        self.find_first(text).is_some()
    }
}

impl Default for ForbiddenWords {
    fn default() -> Self {
        Self::new(DEFAULT_FORBIDDEN_WORDS)
    }
}

impl From<Vec<String>> for ForbiddenWords {
    fn from(words: Vec<String>) -> Self {
        Self::new(words)
    }
}

impl From<ForbiddenWords> for Vec<String> {
    fn from(words: ForbiddenWords) -> Self {
        words.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list() {
        let words = ForbiddenWords::default();
        assert_eq!(words.words().len(), 6);
        assert!(words.words().iter().all(|w| !w.contains('I')));
    }

    #[test]
    fn test_case_insensitive_match() {
        let words = ForbiddenWords::new(["ass"]);
        assert_eq!(words.find_first("dcass"), Some((2, 5)));
        assert_eq!(words.find_first("DCASS1"), Some((2, 5)));
        assert_eq!(words.find_first("DCAST"), None);
    }

    #[test]
    fn test_list_order_decides_first_match() {
        let words = ForbiddenWords::new(["TURD", "FART"]);
        assert_eq!(words.find_first("FARTURD"), Some((3, 7)));
    }

    #[test]
    fn test_extended_with_i_words() {
        let words = ForbiddenWords::default().extended(I_FORBIDDEN_WORDS);
        assert_eq!(words.words().len(), 9);
        assert!(words.is_found_in("0TIT0"));
        assert!(!ForbiddenWords::default().is_found_in("0TIT0"));
    }

    #[test]
    fn test_none_never_matches() {
        let words = ForbiddenWords::none();
        assert!(words.is_empty());
        assert!(!words.is_found_in("BALLS"));
    }

    #[test]
    fn test_serde_as_plain_list() {
        let words = ForbiddenWords::new(["balls"]);
        let json = serde_json::to_string(&words).unwrap();
        assert_eq!(json, r#"["BALLS"]"#);
        let parsed: ForbiddenWords = serde_json::from_str(r#"["fart"]"#).unwrap();
        assert_eq!(parsed.words(), ["FART".to_string()]);
    }

    #[test]
    fn test_expanding_case_fold_matches_listed_word() {
        let words = ForbiddenWords::new(["straße"]);
        assert_eq!(words.words(), ["STRASSE".to_string()]);
        assert_eq!(words.find_first("xstraßey"), Some((1, 7)));
        assert_eq!(words.find_first("XSTRASSEY"), Some((1, 8)));
    }
}
