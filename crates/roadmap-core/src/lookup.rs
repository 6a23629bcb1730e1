//! Cache lookups: exact title match, then keyword similarity

use roadmap_model::Roadmap;
use roadmap_search::{KeywordExtractor, Query, ScoredRoadmap, SimilarityMatcher};
use roadmap_store::{FindOptions, RoadmapFilter, RoadmapStore, StoreError};
use std::sync::Arc;
use tracing::debug;

/// Read-only search over stored roadmaps
#[derive(Clone)]
pub struct Lookup {
    store: Arc<dyn RoadmapStore>,
    extractor: KeywordExtractor,
    matcher: SimilarityMatcher,
}

impl Lookup {
    #[must_use]
    pub fn new(store: Arc<dyn RoadmapStore>, extractor: KeywordExtractor, matcher: SimilarityMatcher) -> Self {
        Self {
            store,
            extractor,
            matcher,
        }
    }

    /// Keyword query for `prompt`
    #[must_use]
    pub fn query(&self, prompt: &str) -> Query {
        Query::from_keywords(self.keywords(prompt))
    }

    /// Search keywords of free text
    #[inline]
    #[must_use]
    pub fn keywords(&self, text: &str) -> Vec<String> {
        self.extractor.extract(text)
    }

    /// Roadmap whose title equals `prompt`, ignoring case and padding
    ///
    /// # Errors
    /// Store failures
    pub async fn exact(&self, prompt: &str) -> Result<Option<Roadmap>, StoreError> {
        let hit = self.store.find_by_title(prompt).await?;
        debug!(hit = hit.is_some(), "exact title lookup");
        Ok(hit)
    }

    /// Roadmaps scoring at least `threshold`, best first
    ///
    /// Candidates come from the store's keyword prefilter; a prompt without
    /// keywords matches nothing.
    ///
    /// # Errors
    /// Store failures
    pub async fn similar(&self, prompt: &str, threshold: f64) -> Result<Vec<ScoredRoadmap>, StoreError> {
        let query = self.query(prompt);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self
            .store
            .find_roadmaps(&RoadmapFilter::matching_any(query.keywords()), FindOptions::default())
            .await?;
        let scanned = candidates.len();
        let ranked = self.matcher.rank(&query, candidates, threshold);
        debug!(scanned, matched = ranked.len(), threshold, "similarity lookup");
        Ok(ranked)
    }
}
