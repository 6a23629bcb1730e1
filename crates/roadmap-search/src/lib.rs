//! Roadmap Search
//!
//! Lexical key space of the roadmap cache:
//! - [`keywords`]: prompt/title keyword extraction
//! - [`fingerprint`]: order-insensitive digest of a keyword set
//! - [`similarity`]: Jaccard-based scoring and ranking of stored roadmaps

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod fingerprint;
pub mod keywords;
pub mod similarity;

pub use fingerprint::{Fingerprint, FingerprintError};
pub use keywords::{extract_keywords, is_stopword, KeywordExtractor, MAX_KEYWORDS};
pub use similarity::{candidate_keywords, jaccard, Query, ScoredRoadmap, SimilarityMatcher, SimilarityWeights};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
