//! Store interface

use crate::error::StoreError;
use crate::filter::{FindOptions, GroupCount, GroupKey, RoadmapFilter};
use crate::ops::{Transaction, WriteOp, WriteReceipt};
use async_trait::async_trait;
use roadmap_model::{Node, Resource, Roadmap, RoadmapId};

/// Document store for roadmaps, their nodes and their resources
///
/// Roadmap writes carry a store-managed `revision`: inserts set it to 1 and each
/// successful update increments it. `update_roadmap` is a compare-and-swap on that
/// revision.
#[async_trait]
pub trait RoadmapStore: Send + Sync {
    // ---------------------------------------------------------------------
    // Roadmaps
    // ---------------------------------------------------------------------

    async fn find_roadmaps(
        &self,
        filter: &RoadmapFilter,
        options: FindOptions,
    ) -> Result<Vec<Roadmap>, StoreError>;

    async fn count_roadmaps(&self, filter: &RoadmapFilter) -> Result<usize, StoreError>;

    async fn find_roadmap(&self, id: RoadmapId) -> Result<Option<Roadmap>, StoreError>;

    /// Case-insensitive whole-title match (trimmed); at most one result
    async fn find_by_title(&self, title: &str) -> Result<Option<Roadmap>, StoreError>;

    /// Insert and return the stored record (revision 1)
    async fn insert_roadmap(&self, roadmap: Roadmap) -> Result<Roadmap, StoreError>;

    /// Replace if the stored revision equals `expected_revision`
    ///
    /// # Errors
    /// [`StoreError::Conflict`] when another writer got there first
    async fn update_roadmap(
        &self,
        roadmap: Roadmap,
        expected_revision: u64,
    ) -> Result<Roadmap, StoreError>;

    /// Atomically bump the view counter and return the updated record
    async fn increment_views(&self, id: RoadmapId) -> Result<Option<Roadmap>, StoreError>;

    // ---------------------------------------------------------------------
    // Nodes and resources
    // ---------------------------------------------------------------------

    async fn insert_node(&self, node: Node) -> Result<(), StoreError>;

    /// Nodes of a roadmap ordered by `(depth, position)`
    async fn find_nodes(&self, roadmap: RoadmapId) -> Result<Vec<Node>, StoreError>;

    async fn delete_nodes(&self, roadmap: RoadmapId) -> Result<usize, StoreError>;

    async fn insert_resource(&self, resource: Resource) -> Result<(), StoreError>;

    async fn find_resources(&self, roadmap: RoadmapId) -> Result<Vec<Resource>, StoreError>;

    async fn delete_resources(&self, roadmap: RoadmapId) -> Result<usize, StoreError>;

    // ---------------------------------------------------------------------
    // Batches and aggregation
    // ---------------------------------------------------------------------

    /// Apply operations independently; one outcome per op, in order
    async fn bulk_write(&self, ops: Vec<WriteOp>) -> Vec<Result<WriteReceipt, StoreError>>;

    /// Apply every staged operation or none
    ///
    /// # Errors
    /// [`StoreError::TransactionAborted`] naming the first failing op
    async fn commit(&self, tx: Transaction) -> Result<Vec<WriteReceipt>, StoreError>;

    /// Count roadmaps matching `filter` grouped by `key`, largest bucket first
    async fn group_count(
        &self,
        filter: &RoadmapFilter,
        key: GroupKey,
    ) -> Result<Vec<GroupCount>, StoreError>;
}
