//! Vote casting with optimistic concurrency

use crate::error::VoteError;
use roadmap_model::{RoadmapId, UserId};
use roadmap_quality::{QualityPolicy, QualityState, Vote, VoteTally};
use roadmap_store::{RoadmapStore, StoreError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies votes as read-modify-write with a revision check
#[derive(Clone)]
pub struct VoteService {
    store: Arc<dyn RoadmapStore>,
    policy: QualityPolicy,
    retry_limit: u32,
}

impl VoteService {
    #[must_use]
    pub fn new(store: Arc<dyn RoadmapStore>, policy: QualityPolicy, retry_limit: u32) -> Self {
        Self {
            store,
            policy,
            retry_limit: retry_limit.max(1),
        }
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> QualityPolicy {
        self.policy
    }

    /// Toggle `voter`'s `vote` on roadmap `id`
    ///
    /// Re-reads and retries when another writer updated the roadmap in between.
    ///
    /// # Errors
    /// [`VoteError::NotFound`] for an unknown roadmap, [`VoteError::Contention`]
    /// after `retry_limit` lost races
    pub async fn cast(&self, id: RoadmapId, voter: UserId, vote: Vote) -> Result<VoteTally, VoteError> {
        for attempt in 1..=self.retry_limit {
            let mut roadmap = self.store.find_roadmap(id).await?.ok_or(VoteError::NotFound(id))?;
            let expected = roadmap.revision;
            let before = QualityState::of(&roadmap);
            let tally = self.policy.apply_vote(&mut roadmap, voter, vote);

            match self.store.update_roadmap(roadmap, expected).await {
                Ok(updated) => {
                    let after = QualityState::of(&updated);
                    if before != after {
                        info!(roadmap = %id, from = ?before, to = ?after, downvotes = tally.downvotes, "quality state changed");
                    }
                    debug!(roadmap = %id, effect = ?tally.effect, score = tally.quality_score, "vote applied");
                    return Ok(tally);
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!(roadmap = %id, attempt, "vote lost a race, retrying");
                }
                Err(StoreError::NotFound { .. }) => return Err(VoteError::NotFound(id)),
                Err(e) => return Err(e.into()),
            }
        }

        warn!(roadmap = %id, attempts = self.retry_limit, "vote abandoned under contention");
        Err(VoteError::Contention {
            id,
            attempts: self.retry_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_model::Roadmap;
    use roadmap_quality::VoteEffect;
    use roadmap_store::MemoryStore;

    async fn setup(threshold: usize) -> (VoteService, RoadmapId) {
        let store = Arc::new(MemoryStore::new());
        let roadmap = store.insert_roadmap(Roadmap::new("Go", "").unwrap()).await.unwrap();
        let service = VoteService::new(store, QualityPolicy::with_threshold(threshold), 8);
        (service, roadmap.id)
    }

    #[tokio::test]
    async fn toggle_and_switch() {
        let (votes, id) = setup(100).await;
        let alice = UserId::new();

        let tally = votes.cast(id, alice, Vote::Up).await.unwrap();
        assert_eq!((tally.effect, tally.upvotes, tally.downvotes), (VoteEffect::Cast, 1, 0));
        assert!((tally.quality_score - 100.0).abs() < f64::EPSILON);

        let tally = votes.cast(id, alice, Vote::Down).await.unwrap();
        assert_eq!((tally.effect, tally.upvotes, tally.downvotes), (VoteEffect::Switched, 0, 1));

        let tally = votes.cast(id, alice, Vote::Down).await.unwrap();
        assert_eq!((tally.effect, tally.upvotes, tally.downvotes), (VoteEffect::Withdrawn, 0, 0));
        assert!(tally.quality_score.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unknown_roadmap() {
        let (votes, _) = setup(100).await;
        let missing = RoadmapId::new();
        assert_eq!(votes.cast(missing, UserId::new(), Vote::Up).await, Err(VoteError::NotFound(missing)));
    }

    #[tokio::test]
    async fn concurrent_votes_are_all_counted() {
        let (votes, id) = setup(1_000).await;
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let votes = votes.clone();
                tokio::spawn(async move { votes.cast(id, UserId::new(), Vote::Down).await })
            })
            .collect();

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                applied += 1;
            }
        }
        let roadmap = votes.store.find_roadmap(id).await.unwrap().unwrap();
        assert_eq!(roadmap.downvotes.len(), applied);
        assert!(roadmap.upvotes.is_empty());
    }
}
