//! Free-text to token-query normalization

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix asking the text-search engine to match any word starting with the token
pub const PREFIX_MARKER: &str = ":*";

/// Conjunction understood by the text-search engine
pub const AND_OPERATOR: &str = " & ";

/// Words of this many bytes or more are never indexed, matching Tantivy's
/// default `RemoveLongFilter`
pub const MAX_WORD_BYTES: usize = 40;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}\s]+").expect("valid pattern"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));

/// A normalized token query: lowercase alphanumeric terms, each matched as
/// a prefix, all required.
///
/// Renders as the wire form `term:* & term:*` through [`fmt::Display`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenQuery {
    terms: Vec<String>,
}

impl TokenQuery {
    /// The prefix terms, in input order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// True when nothing survived normalization; callers must then skip
    /// the text-search predicate entirely
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// `Some(self)` when there is at least one term
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for TokenQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(AND_OPERATOR)?;
            }
            write!(f, "{}{}", term, PREFIX_MARKER)?;
        }
        Ok(())
    }
}

/// Normalize raw search input into a [`TokenQuery`].
///
/// Lowercases, replaces every non-alphanumeric character with a space,
/// collapses whitespace and drops single-character words and words of
/// [`MAX_WORD_BYTES`] or more.
pub fn normalize(raw: &str) -> TokenQuery {
    let lowered = raw.trim().to_lowercase();
    let cleaned = NON_ALPHANUMERIC.replace_all(&lowered, " ");
    let collapsed = WHITESPACE_RUN.replace_all(cleaned.trim(), " ");

    let terms = collapsed
        .split(' ')
        .filter(|word| word.chars().count() > 1 && word.len() < MAX_WORD_BYTES)
        .map(str::to_string)
        .collect();

    TokenQuery { terms }
}

/// Split stored text into lowercase words the same way queries are split
pub(crate) fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| !word.is_empty() && word.len() < MAX_WORD_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_normalization() {
        let query = normalize("  Senior DevOps Engineer ");
        assert_eq!(query.terms(), &["senior", "devops", "engineer"]);
        assert_eq!(query.to_string(), "senior:* & devops:* & engineer:*");
    }

    #[test]
    fn test_overlong_words_are_dropped() {
        let long = "a".repeat(MAX_WORD_BYTES);
        let query = normalize(&format!("rust {} dev", long));
        assert_eq!(query.terms(), &["rust", "dev"]);

        let kept = "b".repeat(MAX_WORD_BYTES - 1);
        assert_eq!(normalize(&kept).terms(), &[kept.clone()]);

        let stored: Vec<String> = words(&format!("Rust {}", long.to_uppercase())).collect();
        assert_eq!(stored, vec!["rust"]);
    }

    #[test]
    fn test_special_characters_become_separators() {
        let query = normalize("front-end, (react)!");
        assert_eq!(query.to_string(), "front:* & end:* & react:*");
    }

    #[test]
    fn test_single_characters_dropped() {
        let query = normalize("a b c data x");
        assert_eq!(query.terms(), &["data"]);
    }

    #[test]
    fn test_empty_after_normalization() {
        assert!(normalize("").is_empty());
        assert!(normalize("   ").is_empty());
        assert!(normalize("! ? a").is_empty());
        assert_eq!(normalize("!!").non_empty(), None);
    }

    #[test]
    fn test_idempotent_over_wire_form() {
        for input in ["Dev Ops", "C++ developer @ Tech-Corp", "  x  ", "ünïcode Straße"] {
            let once = normalize(input);
            let twice = normalize(&once.to_string());
            assert_eq!(once, twice, "input: {input}");
        }
    }

    #[test]
    fn test_words_splits_like_queries() {
        let words: Vec<_> = words("Tech-Corp Design_Studio").collect();
        assert_eq!(words, vec!["tech", "corp", "design", "studio"]);
    }
}
