//! In-memory store with JSON snapshots
//!
//! All three collections live behind one `parking_lot::RwLock`, which makes every
//! single operation atomic. Transactions apply to a scratch copy and swap it in
//! only when every staged op succeeded.

use crate::error::StoreError;
use crate::filter::{FindOptions, GroupCount, GroupKey, RoadmapFilter};
use crate::ops::{Transaction, WriteOp, WriteReceipt};
use crate::store::RoadmapStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use roadmap_model::{Node, NodeId, Resource, ResourceId, Roadmap, RoadmapId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
struct Tables {
    roadmaps: BTreeMap<RoadmapId, Roadmap>,
    nodes: BTreeMap<NodeId, Node>,
    resources: BTreeMap<ResourceId, Resource>,
}

impl Tables {
    fn apply(&mut self, op: WriteOp) -> Result<WriteReceipt, StoreError> {
        match op {
            WriteOp::InsertRoadmap(mut roadmap) => {
                if self.roadmaps.contains_key(&roadmap.id) {
                    return Err(StoreError::Duplicate {
                        kind: "roadmap",
                        id: roadmap.id.to_string(),
                    });
                }
                roadmap.revision = 1;
                self.roadmaps.insert(roadmap.id, roadmap);
                Ok(WriteReceipt::revised(1))
            }
            WriteOp::UpdateRoadmap {
                mut roadmap,
                expected_revision,
            } => {
                let stored = self
                    .roadmaps
                    .get_mut(&roadmap.id)
                    .ok_or_else(|| StoreError::roadmap_not_found(roadmap.id))?;
                if stored.revision != expected_revision {
                    return Err(StoreError::Conflict {
                        id: roadmap.id,
                        expected: expected_revision,
                        actual: stored.revision,
                    });
                }
                roadmap.revision = stored.revision + 1;
                let revision = roadmap.revision;
                *stored = roadmap;
                Ok(WriteReceipt::revised(revision))
            }
            WriteOp::DeleteRoadmap(id) => {
                Ok(WriteReceipt::affected(usize::from(self.roadmaps.remove(&id).is_some())))
            }
            WriteOp::InsertNode(node) => {
                if self.nodes.contains_key(&node.id) {
                    return Err(StoreError::Duplicate {
                        kind: "node",
                        id: node.id.to_string(),
                    });
                }
                self.nodes.insert(node.id, node);
                Ok(WriteReceipt::affected(1))
            }
            WriteOp::UpdateNode(node) => {
                let stored = self
                    .nodes
                    .get_mut(&node.id)
                    .filter(|stored| stored.roadmap == node.roadmap)
                    .ok_or_else(|| StoreError::NotFound {
                        kind: "node",
                        id: node.id.to_string(),
                    })?;
                *stored = node;
                Ok(WriteReceipt::affected(1))
            }
            WriteOp::DeleteNodes(roadmap) => {
                let before = self.nodes.len();
                self.nodes.retain(|_, n| n.roadmap != roadmap);
                Ok(WriteReceipt::affected(before - self.nodes.len()))
            }
            WriteOp::InsertResource(resource) => {
                if self.resources.contains_key(&resource.id) {
                    return Err(StoreError::Duplicate {
                        kind: "resource",
                        id: resource.id.to_string(),
                    });
                }
                self.resources.insert(resource.id, resource);
                Ok(WriteReceipt::affected(1))
            }
            WriteOp::DeleteResources(roadmap) => {
                let before = self.resources.len();
                self.resources.retain(|_, r| r.roadmap != roadmap);
                Ok(WriteReceipt::affected(before - self.resources.len()))
            }
        }
    }
}

/// Serialized form of a [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub roadmaps: Vec<Roadmap>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store populated from a snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let tables = Tables {
            roadmaps: snapshot.roadmaps.into_iter().map(|r| (r.id, r)).collect(),
            nodes: snapshot.nodes.into_iter().map(|n| (n.id, n)).collect(),
            resources: snapshot.resources.into_iter().map(|r| (r.id, r)).collect(),
        };
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Copy of the current contents
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read();
        Snapshot {
            roadmaps: tables.roadmaps.values().cloned().collect(),
            nodes: tables.nodes.values().cloned().collect(),
            resources: tables.resources.values().cloned().collect(),
        }
    }

    /// Load a JSON snapshot; a missing file yields an empty store
    ///
    /// # Errors
    /// [`StoreError::Snapshot`] if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no snapshot, starting empty");
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Snapshot(format!("read {}: {e}", path.display())))?;
        let snapshot: Snapshot = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Snapshot(format!("parse {}: {e}", path.display())))?;
        debug!(
            path = %path.display(),
            roadmaps = snapshot.roadmaps.len(),
            nodes = snapshot.nodes.len(),
            "snapshot loaded"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write a JSON snapshot, replacing the file atomically
    ///
    /// # Errors
    /// [`StoreError::Snapshot`] on serialization or I/O failure
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| StoreError::Snapshot(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| StoreError::Snapshot(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| StoreError::Snapshot(format!("rename to {}: {e}", path.display())))?;
        Ok(())
    }

    fn apply(&self, op: WriteOp) -> Result<WriteReceipt, StoreError> {
        self.tables.write().apply(op)
    }
}

#[async_trait]
impl RoadmapStore for MemoryStore {
    async fn find_roadmaps(
        &self,
        filter: &RoadmapFilter,
        options: FindOptions,
    ) -> Result<Vec<Roadmap>, StoreError> {
        let mut found: Vec<Roadmap> = self
            .tables
            .read()
            .roadmaps
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        options.sort(&mut found);
        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(found.into_iter().skip(options.skip).take(limit).collect())
    }

    async fn count_roadmaps(&self, filter: &RoadmapFilter) -> Result<usize, StoreError> {
        Ok(self
            .tables
            .read()
            .roadmaps
            .values()
            .filter(|r| filter.matches(r))
            .count())
    }

    async fn find_roadmap(&self, id: RoadmapId) -> Result<Option<Roadmap>, StoreError> {
        Ok(self.tables.read().roadmaps.get(&id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Roadmap>, StoreError> {
        if title.trim().is_empty() {
            return Ok(None);
        }
        let tables = self.tables.read();
        let mut hits: Vec<&Roadmap> = tables
            .roadmaps
            .values()
            .filter(|r| r.title_matches(title))
            .collect();
        hits.sort_by_key(|r| r.created_at);
        Ok(hits.first().map(|r| (*r).clone()))
    }

    async fn insert_roadmap(&self, roadmap: Roadmap) -> Result<Roadmap, StoreError> {
        let mut stored = roadmap.clone();
        let receipt = self.apply(WriteOp::InsertRoadmap(roadmap))?;
        stored.revision = receipt.revision.unwrap_or(1);
        Ok(stored)
    }

    async fn update_roadmap(
        &self,
        roadmap: Roadmap,
        expected_revision: u64,
    ) -> Result<Roadmap, StoreError> {
        let mut stored = roadmap.clone();
        let receipt = self.apply(WriteOp::UpdateRoadmap {
            roadmap,
            expected_revision,
        })?;
        stored.revision = receipt.revision.unwrap_or(expected_revision + 1);
        Ok(stored)
    }

    async fn increment_views(&self, id: RoadmapId) -> Result<Option<Roadmap>, StoreError> {
        let mut tables = self.tables.write();
        Ok(tables.roadmaps.get_mut(&id).map(|roadmap| {
            roadmap.stats.views += 1;
            roadmap.revision += 1;
            roadmap.clone()
        }))
    }

    async fn insert_node(&self, node: Node) -> Result<(), StoreError> {
        self.apply(WriteOp::InsertNode(node)).map(|_| ())
    }

    async fn find_nodes(&self, roadmap: RoadmapId) -> Result<Vec<Node>, StoreError> {
        let mut nodes: Vec<Node> = self
            .tables
            .read()
            .nodes
            .values()
            .filter(|n| n.roadmap == roadmap)
            .cloned()
            .collect();
        nodes.sort_by_key(|n| (n.depth, n.position));
        Ok(nodes)
    }

    async fn delete_nodes(&self, roadmap: RoadmapId) -> Result<usize, StoreError> {
        Ok(self.apply(WriteOp::DeleteNodes(roadmap))?.affected)
    }

    async fn insert_resource(&self, resource: Resource) -> Result<(), StoreError> {
        self.apply(WriteOp::InsertResource(resource)).map(|_| ())
    }

    async fn find_resources(&self, roadmap: RoadmapId) -> Result<Vec<Resource>, StoreError> {
        Ok(self
            .tables
            .read()
            .resources
            .values()
            .filter(|r| r.roadmap == roadmap)
            .cloned()
            .collect())
    }

    async fn delete_resources(&self, roadmap: RoadmapId) -> Result<usize, StoreError> {
        Ok(self.apply(WriteOp::DeleteResources(roadmap))?.affected)
    }

    async fn bulk_write(&self, ops: Vec<WriteOp>) -> Vec<Result<WriteReceipt, StoreError>> {
        let mut tables = self.tables.write();
        ops.into_iter()
            .map(|op| {
                let label = op.label();
                tables.apply(op).map_err(|e| {
                    warn!(op = label, error = %e, "bulk write op failed");
                    e
                })
            })
            .collect()
    }

    async fn commit(&self, tx: Transaction) -> Result<Vec<WriteReceipt>, StoreError> {
        let mut tables = self.tables.write();
        let mut scratch = tables.clone();
        let staged = tx.len();
        let mut receipts = Vec::with_capacity(staged);

        for (index, op) in tx.into_ops().into_iter().enumerate() {
            match scratch.apply(op) {
                Ok(receipt) => receipts.push(receipt),
                Err(e) => {
                    warn!(index, error = %e, "transaction rolled back");
                    return Err(StoreError::TransactionAborted {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        *tables = scratch;
        debug!(ops = staged, "transaction committed");
        Ok(receipts)
    }

    async fn group_count(
        &self,
        filter: &RoadmapFilter,
        key: GroupKey,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let mut buckets: BTreeMap<&'static str, usize> = BTreeMap::new();
        for roadmap in self.tables.read().roadmaps.values().filter(|r| filter.matches(r)) {
            *buckets.entry(key.value_of(roadmap)).or_default() += 1;
        }

        let mut counts: Vec<GroupCount> = buckets
            .into_iter()
            .map(|(key, count)| GroupCount {
                key: key.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use roadmap_model::{Category, NodeDraft, ResourceType};

    fn roadmap(title: &str) -> Roadmap {
        Roadmap::new(title, "").unwrap()
    }

    #[tokio::test]
    async fn insert_sets_revision_and_update_is_cas() {
        let store = MemoryStore::new();
        let stored = store.insert_roadmap(roadmap("Rust")).await.unwrap();
        assert_eq!(stored.revision, 1);

        let mut edited = stored.clone();
        edited.description = "systems".into();
        let updated = store.update_roadmap(edited.clone(), 1).await.unwrap();
        assert_eq!(updated.revision, 2);

        let stale = store.update_roadmap(edited, 1).await.unwrap_err();
        assert!(stale.is_conflict());
        assert_eq!(
            store.find_roadmap(stored.id).await.unwrap().unwrap().description,
            "systems"
        );
    }

    #[tokio::test]
    async fn duplicate_insert_rejected() {
        let store = MemoryStore::new();
        let r = roadmap("Go");
        store.insert_roadmap(r.clone()).await.unwrap();
        assert!(matches!(
            store.insert_roadmap(r).await,
            Err(StoreError::Duplicate { kind: "roadmap", .. })
        ));
    }

    #[tokio::test]
    async fn find_by_title_is_case_insensitive_whole_title() {
        let store = MemoryStore::new();
        store.insert_roadmap(roadmap("Frontend Development")).await.unwrap();

        assert!(store.find_by_title("frontend development").await.unwrap().is_some());
        assert!(store.find_by_title("  FRONTEND DEVELOPMENT ").await.unwrap().is_some());
        assert!(store.find_by_title("frontend").await.unwrap().is_none());
        assert!(store.find_by_title("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn nodes_come_back_in_depth_position_order() {
        let store = MemoryStore::new();
        let r = store.insert_roadmap(roadmap("Tree")).await.unwrap();
        let root = Node::root(r.id, 0, NodeDraft::titled("root"));
        let child = Node::child_of(&root, 2, Vec::new(), NodeDraft::titled("child"));
        let second_root = Node::root(r.id, 1, NodeDraft::titled("second"));

        store.insert_node(child.clone()).await.unwrap();
        store.insert_node(second_root.clone()).await.unwrap();
        store.insert_node(root.clone()).await.unwrap();

        let ids: Vec<_> = store.find_nodes(r.id).await.unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![root.id, second_root.id, child.id]);
    }

    #[tokio::test]
    async fn transaction_is_all_or_nothing() {
        let store = MemoryStore::new();
        let r = store.insert_roadmap(roadmap("Atomic")).await.unwrap();
        store
            .insert_node(Node::root(r.id, 0, NodeDraft::titled("n")))
            .await
            .unwrap();

        let mut tx = Transaction::new();
        tx.stage_clear_tree(r.id)
            .stage(WriteOp::UpdateRoadmap {
                roadmap: r.clone(),
                expected_revision: 99,
            });
        let err = store.commit(tx).await.unwrap_err();
        assert!(matches!(err, StoreError::TransactionAborted { index: 2, .. }));
        assert_eq!(store.find_nodes(r.id).await.unwrap().len(), 1);

        let mut tx = Transaction::new();
        tx.stage_clear_tree(r.id)
            .stage(WriteOp::DeleteRoadmap(r.id));
        let receipts = store.commit(tx).await.unwrap();
        assert_eq!(receipts.len(), 3);
        assert!(store.find_nodes(r.id).await.unwrap().is_empty());
        assert!(store.find_roadmap(r.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bulk_write_reports_each_op() {
        let store = MemoryStore::new();
        let r = roadmap("Bulk");
        let outcomes = store
            .bulk_write(vec![
                WriteOp::InsertRoadmap(r.clone()),
                WriteOp::InsertRoadmap(r.clone()),
                WriteOp::DeleteNodes(r.id),
            ])
            .await;
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert_eq!(outcomes[2].as_ref().unwrap().affected, 0);
        assert!(store.find_roadmap(r.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_resources_is_scoped_to_roadmap() {
        let store = MemoryStore::new();
        let id = RoadmapId::new();
        let other = RoadmapId::new();
        store
            .insert_resource(Resource::new(id, "a", "https://a", ResourceType::Article))
            .await
            .unwrap();
        store
            .insert_resource(Resource::new(id, "b", "https://b", ResourceType::Video).approved(true, None))
            .await
            .unwrap();
        store
            .insert_resource(Resource::new(other, "c", "https://c", ResourceType::Book))
            .await
            .unwrap();

        assert_eq!(store.delete_resources(id).await.unwrap(), 2);
        assert!(store.find_resources(id).await.unwrap().is_empty());
        assert_eq!(store.find_resources(other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_node_stays_within_its_roadmap() {
        let store = MemoryStore::new();
        let r = RoadmapId::new();
        let mut node = Node::root(r, 0, NodeDraft::titled("Basics"));
        store.insert_node(node.clone()).await.unwrap();

        node.title = "Fundamentals".into();
        let outcomes = store.bulk_write(vec![WriteOp::UpdateNode(node.clone())]).await;
        assert_eq!(outcomes[0].as_ref().unwrap().affected, 1);
        assert_eq!(store.find_nodes(r).await.unwrap()[0].title, "Fundamentals");

        let mut foreign = node.clone();
        foreign.roadmap = RoadmapId::new();
        let outcomes = store.bulk_write(vec![WriteOp::UpdateNode(foreign)]).await;
        assert!(matches!(outcomes[0], Err(StoreError::NotFound { kind: "node", .. })));
    }

    #[tokio::test]
    async fn group_count_by_category() {
        let store = MemoryStore::new();
        for (title, category) in [
            ("A", Category::Frontend),
            ("B", Category::Frontend),
            ("C", Category::Cloud),
        ] {
            store
                .insert_roadmap(roadmap(title).with_category(category))
                .await
                .unwrap();
        }

        let counts = store.group_count(&RoadmapFilter::all(), GroupKey::Category).await.unwrap();
        assert_eq!(
            counts,
            vec![
                GroupCount { key: "frontend".into(), count: 2 },
                GroupCount { key: "cloud".into(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn increment_views_bumps_revision() {
        let store = MemoryStore::new();
        let r = store.insert_roadmap(roadmap("Views")).await.unwrap();
        let viewed = store.increment_views(r.id).await.unwrap().unwrap();
        assert_eq!(viewed.stats.views, 1);
        assert_eq!(viewed.revision, 2);
        assert!(store.increment_views(RoadmapId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::new();
        let r = store.insert_roadmap(roadmap("Persisted")).await.unwrap();
        store
            .insert_node(Node::root(r.id, 0, NodeDraft::titled("root")))
            .await
            .unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.snapshot(), store.snapshot());
        assert!(MemoryStore::load(dir.path().join("missing.json")).unwrap().snapshot().roadmaps.is_empty());
    }
}
