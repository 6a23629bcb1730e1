//! Store wrapper with injectable write failures

use async_trait::async_trait;
use roadmap_model::{Node, Resource, Roadmap, RoadmapId};
use roadmap_store::{
    FindOptions, GroupCount, GroupKey, MemoryStore, RoadmapFilter, RoadmapStore,
    StoreError, Transaction, WriteOp, WriteReceipt,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// [`MemoryStore`] that fails node inserts after a budget, or every commit
///
/// Node inserts staged in a transaction draw on the same budget; the first one
/// over it aborts the whole commit.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    node_budget: AtomicUsize,
    limit_nodes: AtomicBool,
    fail_commits: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Let `successes` node inserts through, then fail every one
    pub fn fail_nodes_after(self, successes: usize) -> Self {
        self.node_budget.store(successes, Ordering::SeqCst);
        self.limit_nodes.store(true, Ordering::SeqCst);
        self
    }

    /// Make every transaction commit fail
    pub fn fail_commits(self) -> Self {
        self.fail_commits.store(true, Ordering::SeqCst);
        self
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        self.limit_nodes.store(false, Ordering::SeqCst);
        self.fail_commits.store(false, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn injected(what: &str) -> StoreError {
        StoreError::Backend(format!("injected {what} failure"))
    }

    fn take_node_budget(&self) -> bool {
        !self.limit_nodes.load(Ordering::SeqCst)
            || self
                .node_budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok()
    }
}

#[async_trait]
impl RoadmapStore for FailingStore {
    async fn find_roadmaps(&self, filter: &RoadmapFilter, options: FindOptions) -> Result<Vec<Roadmap>, StoreError> {
        self.inner.find_roadmaps(filter, options).await
    }

    async fn count_roadmaps(&self, filter: &RoadmapFilter) -> Result<usize, StoreError> {
        self.inner.count_roadmaps(filter).await
    }

    async fn find_roadmap(&self, id: RoadmapId) -> Result<Option<Roadmap>, StoreError> {
        self.inner.find_roadmap(id).await
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Roadmap>, StoreError> {
        self.inner.find_by_title(title).await
    }

    async fn insert_roadmap(&self, roadmap: Roadmap) -> Result<Roadmap, StoreError> {
        self.inner.insert_roadmap(roadmap).await
    }

    async fn update_roadmap(&self, roadmap: Roadmap, expected_revision: u64) -> Result<Roadmap, StoreError> {
        self.inner.update_roadmap(roadmap, expected_revision).await
    }

    async fn increment_views(&self, id: RoadmapId) -> Result<Option<Roadmap>, StoreError> {
        self.inner.increment_views(id).await
    }

    async fn insert_node(&self, node: Node) -> Result<(), StoreError> {
        if !self.take_node_budget() {
            return Err(Self::injected("node insert"));
        }
        self.inner.insert_node(node).await
    }

    async fn find_nodes(&self, roadmap: RoadmapId) -> Result<Vec<Node>, StoreError> {
        self.inner.find_nodes(roadmap).await
    }

    async fn delete_nodes(&self, roadmap: RoadmapId) -> Result<usize, StoreError> {
        self.inner.delete_nodes(roadmap).await
    }

    async fn insert_resource(&self, resource: Resource) -> Result<(), StoreError> {
        self.inner.insert_resource(resource).await
    }

    async fn find_resources(&self, roadmap: RoadmapId) -> Result<Vec<Resource>, StoreError> {
        self.inner.find_resources(roadmap).await
    }

    async fn delete_resources(&self, roadmap: RoadmapId) -> Result<usize, StoreError> {
        self.inner.delete_resources(roadmap).await
    }

    async fn bulk_write(&self, ops: Vec<WriteOp>) -> Vec<Result<WriteReceipt, StoreError>> {
        self.inner.bulk_write(ops).await
    }

    async fn commit(&self, tx: Transaction) -> Result<Vec<WriteReceipt>, StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            tx.abort();
            return Err(Self::injected("commit"));
        }
        let over_budget = tx
            .ops()
            .iter()
            .position(|op| matches!(op, WriteOp::InsertNode(_)) && !self.take_node_budget());
        if let Some(index) = over_budget {
            tx.abort();
            return Err(StoreError::TransactionAborted {
                index,
                reason: Self::injected("node insert").to_string(),
            });
        }
        self.inner.commit(tx).await
    }

    async fn group_count(&self, filter: &RoadmapFilter, key: GroupKey) -> Result<Vec<GroupCount>, StoreError> {
        self.inner.group_count(filter, key).await
    }
}
