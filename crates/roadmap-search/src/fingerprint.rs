//! Prompt fingerprints
//!
//! A [`Fingerprint`] is the Blake3 digest of a prompt's normalized keyword set
//! (sorted, deduplicated). Prompts that differ only in word order, filler words,
//! repetition or punctuation share a fingerprint and therefore a single-flight slot.

use crate::keywords::extract_keywords;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Separator between keywords in the hashed form; never produced by extraction
const SEPARATOR: u8 = 0x1f;

/// A 32-byte keyword-set digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fingerprint of a keyword collection (order and duplicates ignored)
    #[must_use]
    pub fn of_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: BTreeSet<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let mut hasher = blake3::Hasher::new();
        for keyword in &normalized {
            hasher.update(keyword.as_bytes());
            hasher.update(&[SEPARATOR]);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Fingerprint of a free-text prompt
    ///
    /// Prompts without any keyword fall back to their lowercased, whitespace
    /// collapsed text so unrelated filler-only prompts do not collide.
    #[must_use]
    pub fn of_prompt(prompt: &str) -> Self {
        let keywords = extract_keywords(prompt);
        if keywords.is_empty() {
            let collapsed = prompt
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let mut hasher = blake3::Hasher::new();
            hasher.update(b"raw:");
            hasher.update(collapsed.as_bytes());
            return Self(*hasher.finalize().as_bytes());
        }
        Self::of_keywords(keywords)
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Error parsing a hex fingerprint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FingerprintError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| FingerprintError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| FingerprintError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
