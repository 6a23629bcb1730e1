//! Keyword extraction
//!
//! Turns free text into a short, ordered keyword list: lowercase, punctuation
//! stripped (hyphens kept), tokens of three or more characters, stopwords and
//! roadmap filler removed, first-occurrence order, capped.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Default cap on extracted keywords
pub const MAX_KEYWORDS: usize = 10;

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"[^\w\s-]").unwrap()
});

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in",
        "is", "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "how",
        "what", "when", "where", "who", "learn", "guide", "tutorial", "roadmap", "i",
        "want", "need", "can", "should", "would", "like", "make", "create", "build",
    ]
    .into_iter()
    .collect()
});

/// Whether `word` is filtered as a stopword
#[inline]
#[must_use]
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Keyword extractor with a configurable cap
#[derive(Debug, Clone, Copy)]
pub struct KeywordExtractor {
    max_keywords: usize,
}

impl KeywordExtractor {
    /// Extractor capped at `max_keywords`
    #[inline]
    #[must_use]
    pub fn new(max_keywords: usize) -> Self {
        Self { max_keywords }
    }

    /// Extract keywords from `text`
    ///
    /// Deterministic; the same text always yields the same list. Repeated words
    /// count toward the cap once per occurrence, mirroring token order.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned = PUNCTUATION.replace_all(&lowered, " ");

        cleaned
            .split_whitespace()
            .filter(|word| word.chars().count() > 2 && !is_stopword(word))
            .take(self.max_keywords)
            .map(str::to_string)
            .collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(MAX_KEYWORDS)
    }
}

/// Extract keywords with the default cap
#[inline]
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    KeywordExtractor::default().extract(text)
}
