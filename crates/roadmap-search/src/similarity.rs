//! Lexical similarity between a prompt and stored roadmaps
//!
//! `similarity = min(1, (jaccard + title_boost) * quality_factor)` where the
//! candidate keyword set is `extract(title) ∪ search_keywords ∪ tags`, the title
//! boost applies when any query keyword occurs in the lowercased title, and the
//! quality factor halves degraded roadmaps.

use crate::fingerprint::Fingerprint;
use crate::keywords::extract_keywords;
use roadmap_model::Roadmap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keywords of a search prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    keywords: Vec<String>,
    set: HashSet<String>,
    fingerprint: Fingerprint,
}

impl Query {
    /// Build from already extracted keywords
    #[must_use]
    pub fn from_keywords(keywords: Vec<String>) -> Self {
        let set = keywords.iter().cloned().collect();
        let fingerprint = Fingerprint::of_keywords(&keywords);
        Self {
            keywords,
            set,
            fingerprint,
        }
    }

    /// Keywords in first-occurrence order
    #[inline]
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Distinct keywords
    #[inline]
    #[must_use]
    pub fn keyword_set(&self) -> &HashSet<String> {
        &self.set
    }

    /// Digest of the keyword set
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Whether the prompt produced no keywords
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// Tunable weights of the similarity formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    /// Added when a query keyword occurs in the title
    pub title_boost: f64,
    /// Multiplier for roadmaps flagged for regeneration
    pub degraded_factor: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            title_boost: 0.2,
            degraded_factor: 0.5,
        }
    }
}

/// A candidate with its similarity
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRoadmap {
    pub roadmap: Roadmap,
    pub similarity: f64,
}

/// Jaccard index; zero if either side is empty
#[must_use]
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Keyword surface of a stored roadmap
#[must_use]
pub fn candidate_keywords(roadmap: &Roadmap) -> HashSet<String> {
    extract_keywords(&roadmap.title)
        .into_iter()
        .chain(roadmap.search_keywords.iter().map(|k| k.to_lowercase()))
        .chain(roadmap.tags.iter().map(|t| t.to_lowercase()))
        .collect()
}

/// Scores and ranks candidates against a query
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityMatcher {
    weights: SimilarityWeights,
}

impl SimilarityMatcher {
    /// Matcher with custom weights
    #[inline]
    #[must_use]
    pub fn new(weights: SimilarityWeights) -> Self {
        Self { weights }
    }

    /// Similarity in `[0, 1]`
    #[must_use]
    pub fn score(&self, query: &Query, candidate: &Roadmap) -> f64 {
        if query.is_empty() {
            return 0.0;
        }

        let base = jaccard(query.keyword_set(), &candidate_keywords(candidate));

        let title = candidate.title.to_lowercase();
        let boost = if query.keywords().iter().any(|k| title.contains(k.as_str())) {
            self.weights.title_boost
        } else {
            0.0
        };

        let factor = if candidate.needs_regeneration {
            self.weights.degraded_factor
        } else {
            1.0
        };

        ((base + boost) * factor).min(1.0)
    }

    /// Score, drop below `threshold`, sort descending (stable on ties)
    #[must_use]
    pub fn rank<I>(&self, query: &Query, candidates: I, threshold: f64) -> Vec<ScoredRoadmap>
    where
        I: IntoIterator<Item = Roadmap>,
    {
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredRoadmap> = candidates
            .into_iter()
            .filter_map(|roadmap| {
                let similarity = self.score(query, &roadmap);
                (similarity >= threshold).then_some(ScoredRoadmap { roadmap, similarity })
            })
            .collect();

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn prompt_query(prompt: &str) -> Query {
        Query::from_keywords(extract_keywords(prompt))
    }

    fn roadmap(title: &str, keywords: &[&str], tags: &[&str]) -> Roadmap {
        Roadmap::new(title, "")
            .unwrap()
            .with_search_keywords(keywords.iter().map(|k| (*k).to_string()).collect())
            .with_tags(tags)
    }

    #[test]
    fn shared_keywords_with_title_boost_pass_fuzzy_threshold() {
        let matcher = SimilarityMatcher::default();
        let query = prompt_query("frontend development basics");
        let candidate = roadmap("Frontend Development", &["frontend", "development"], &[]);

        let score = matcher.score(&query, &candidate);
        assert!(score > 0.7, "score was {score}");
    }

    #[test]
    fn no_shared_keywords_yields_nothing() {
        let matcher = SimilarityMatcher::default();
        let query = prompt_query("quantum chemistry");
        let candidates = vec![roadmap("Frontend Development", &["frontend"], &["react"])];
        assert!(matcher.rank(&query, candidates, 0.3).is_empty());
    }

    #[test]
    fn empty_query_yields_nothing() {
        let matcher = SimilarityMatcher::default();
        let query = prompt_query("learn the guide");
        assert!(query.is_empty());
        let candidates = vec![roadmap("Guide", &["guide"], &[])];
        assert!(matcher.rank(&query, candidates, 0.0).is_empty());
    }

    #[test]
    fn degraded_roadmaps_are_halved() {
        let matcher = SimilarityMatcher::default();
        let query = prompt_query("rust systems");
        let fresh = roadmap("Rust Systems", &["rust", "systems"], &[]);
        let mut degraded = fresh.clone();
        degraded.needs_regeneration = true;

        let fresh_score = matcher.score(&query, &fresh);
        let degraded_score = matcher.score(&query, &degraded);
        // 1.0 jaccard + 0.2 boost, capped for fresh, halved before the cap when degraded
        assert!((fresh_score - 1.0).abs() < 1e-9);
        assert!((degraded_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn rank_sorts_descending_and_keeps_tie_order() {
        let matcher = SimilarityMatcher::default();
        let query = prompt_query("python data analysis");
        let first_tie = roadmap("Tools A", &["python"], &[]);
        let second_tie = roadmap("Tools B", &["python"], &[]);
        let best = roadmap("Python Data Analysis", &["python", "data", "analysis"], &[]);

        let ranked = matcher.rank(
            &query,
            vec![first_tie.clone(), second_tie.clone(), best.clone()],
            0.1,
        );
        let ids: Vec<_> = ranked.iter().map(|s| s.roadmap.id).collect();
        assert_eq!(ids, vec![best.id, first_tie.id, second_tie.id]);
    }

    #[test]
    fn jaccard_of_empty_is_zero() {
        let a: HashSet<String> = HashSet::new();
        let b: HashSet<String> = ["x".to_string()].into_iter().collect();
        assert!(jaccard(&a, &b).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn score_is_bounded(
            title in "[a-z ]{3,30}",
            prompt in "[a-z ]{3,30}",
            degraded in any::<bool>(),
        ) {
            let matcher = SimilarityMatcher::default();
            let mut candidate = Roadmap::new(format!("t {title}"), "").unwrap();
            candidate.search_keywords = extract_keywords(&title);
            candidate.needs_regeneration = degraded;
            let score = matcher.score(&prompt_query(&prompt), &candidate);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
