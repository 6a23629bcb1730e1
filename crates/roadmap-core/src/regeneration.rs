//! Replacing a roadmap's tree after quality degraded or on request
//!
//! The new tree is generated and validated before anything is touched, then the
//! old tree, the new tree and the reset roadmap record are committed as one
//! transaction. A failed regeneration leaves the roadmap exactly as it was.

use crate::error::RegenerationError;
use crate::generator::Generator;
use crate::persist::{plan_tree, Attribution};
use chrono::Utc;
use dashmap::DashMap;
use roadmap_model::{Actor, Node, RegenerationRecord, Resource, Roadmap, RoadmapId};
use roadmap_quality::{validate_transition, QualityPolicy, QualityState, RegenerationGrant};
use roadmap_store::{RoadmapStore, StoreError, Transaction, WriteOp};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Completed regeneration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegenerationReport {
    pub roadmap: Roadmap,
    pub nodes: Vec<Node>,
    pub resources: Vec<Resource>,
    pub grant: RegenerationGrant,
    pub previous_downvotes: usize,
}

/// Per-roadmap critical section around regeneration
#[derive(Clone)]
pub struct RegenerationService {
    store: Arc<dyn RoadmapStore>,
    generator: Generator,
    policy: QualityPolicy,
    retry_limit: u32,
    active: Arc<DashMap<RoadmapId, ()>>,
}

/// Marks a roadmap as regenerating until dropped
struct ActiveGuard {
    id: RoadmapId,
    active: Arc<DashMap<RoadmapId, ()>>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.remove(&self.id);
    }
}

impl RegenerationService {
    #[must_use]
    pub fn new(store: Arc<dyn RoadmapStore>, generator: Generator, policy: QualityPolicy, retry_limit: u32) -> Self {
        Self {
            store,
            generator,
            policy,
            retry_limit: retry_limit.max(1),
            active: Arc::new(DashMap::new()),
        }
    }

    /// Whether `id` is being regenerated right now
    #[inline]
    #[must_use]
    pub fn is_active(&self, id: RoadmapId) -> bool {
        self.active.contains_key(&id)
    }

    fn enter(&self, id: RoadmapId) -> Result<ActiveGuard, RegenerationError> {
        use dashmap::mapref::entry::Entry;
        match self.active.entry(id) {
            Entry::Occupied(_) => Err(RegenerationError::InProgress(id)),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(ActiveGuard {
                    id,
                    active: Arc::clone(&self.active),
                })
            }
        }
    }

    /// Regenerate roadmap `id` on behalf of `actor`
    ///
    /// Allowed for anyone while the roadmap is flagged, otherwise only for an
    /// admin or the owner. Votes are cleared, the score reset, `version` bumped
    /// and a history entry appended. Title, description and category are kept.
    ///
    /// # Errors
    /// - [`RegenerationError::NotFound`] for an unknown roadmap
    /// - [`RegenerationError::NotPermitted`] when `actor` may not regenerate it,
    ///   checked again whenever the roadmap changed before the commit
    /// - [`RegenerationError::InProgress`] when another regeneration holds it
    /// - [`RegenerationError::Generation`] when the oracle fails or answers badly
    /// - [`RegenerationError::Store`] when the commit fails
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn regenerate(&self, id: RoadmapId, actor: &Actor) -> Result<RegenerationReport, RegenerationError> {
        let roadmap = self.find(id).await?;
        let mut grant = self.policy.authorize_regeneration(actor, &roadmap)?;
        let _active = self.enter(id)?;

        let from = QualityState::of(&roadmap);
        validate_transition(from, QualityState::Regenerating)?;
        info!(roadmap = %id, from = ?from, reason = %grant.reason(), "regenerating roadmap");

        let prompt = format!("{} - {}", roadmap.title, roadmap.description);
        let generated = self.generator.generate(&prompt).await?;
        let attribution = Attribution {
            requester: Some(actor.id),
            community: roadmap.is_community_contributed,
        };

        let mut current = roadmap;
        for attempt in 1..=self.retry_limit {
            let plan = plan_tree(id, &generated.nodes, attribution);
            let nodes: Vec<Node> = plan.nodes().cloned().collect();
            let resources: Vec<Resource> = plan.resources().cloned().collect();

            let previous_downvotes = current.downvotes.len();
            let mut next = current.clone();
            next.upvotes.clear();
            next.downvotes.clear();
            next.quality_score = 0.0;
            next.needs_regeneration = false;
            next.regeneration_history.push(RegenerationRecord {
                regenerated_at: Utc::now(),
                reason: grant.reason(),
                previous_downvotes,
            });
            next.touch_structure(Some(actor.id));

            let mut tx = Transaction::new();
            tx.stage_clear_tree(id);
            plan.stage_into(&mut tx);
            tx.stage(WriteOp::UpdateRoadmap {
                roadmap: next.clone(),
                expected_revision: current.revision,
            });

            match self.store.commit(tx).await {
                Ok(receipts) => {
                    next.revision = receipts
                        .last()
                        .and_then(|r| r.revision)
                        .unwrap_or(current.revision + 1);
                    info!(roadmap = %id, version = next.version, nodes = nodes.len(), "roadmap regenerated");
                    return Ok(RegenerationReport {
                        roadmap: next,
                        nodes,
                        resources,
                        grant,
                        previous_downvotes,
                    });
                }
                Err(e) => {
                    let latest = self.find(id).await?;
                    if latest.revision == current.revision {
                        warn!(roadmap = %id, error = %e, "regeneration commit failed");
                        return Err(e.into());
                    }
                    debug!(roadmap = %id, attempt, "roadmap changed during regeneration, retrying commit");
                    grant = self.policy.authorize_regeneration(actor, &latest)?;
                    current = latest;
                }
            }
        }

        Err(StoreError::Conflict {
            id,
            expected: current.revision,
            actual: self.find(id).await?.revision,
        }
        .into())
    }

    async fn find(&self, id: RoadmapId) -> Result<Roadmap, RegenerationError> {
        self.store
            .find_roadmap(id)
            .await?
            .ok_or(RegenerationError::NotFound(id))
    }
}
