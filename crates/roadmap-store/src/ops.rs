//! Write operations, bulk writes and staged transactions

use roadmap_model::{Node, Resource, Roadmap, RoadmapId};

/// A single store mutation
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    InsertRoadmap(Roadmap),
    /// Replace a roadmap if its stored revision still equals `expected_revision`
    UpdateRoadmap {
        roadmap: Roadmap,
        expected_revision: u64,
    },
    DeleteRoadmap(RoadmapId),
    InsertNode(Node),
    /// Replace a stored node of the same roadmap
    UpdateNode(Node),
    /// Delete every node of a roadmap
    DeleteNodes(RoadmapId),
    InsertResource(Resource),
    /// Delete every resource owned by a roadmap
    DeleteResources(RoadmapId),
}

impl WriteOp {
    /// Short label for logs
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::InsertRoadmap(_) => "insert_roadmap",
            Self::UpdateRoadmap { .. } => "update_roadmap",
            Self::DeleteRoadmap(_) => "delete_roadmap",
            Self::InsertNode(_) => "insert_node",
            Self::UpdateNode(_) => "update_node",
            Self::DeleteNodes(_) => "delete_nodes",
            Self::InsertResource(_) => "insert_resource",
            Self::DeleteResources(_) => "delete_resources",
        }
    }
}

/// Result of an applied write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Records inserted, replaced or deleted
    pub affected: usize,
    /// Revision of the roadmap after an insert/update
    pub revision: Option<u64>,
}

impl WriteReceipt {
    #[inline]
    #[must_use]
    pub fn affected(affected: usize) -> Self {
        Self {
            affected,
            revision: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn revised(revision: u64) -> Self {
        Self {
            affected: 1,
            revision: Some(revision),
        }
    }
}

/// Staged multi-document transaction
///
/// Operations are only buffered here; `RoadmapStore::commit` applies all of them
/// or none. Dropping or calling [`Transaction::abort`] discards the staged work.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "a transaction does nothing until committed"]
pub struct Transaction {
    ops: Vec<WriteOp>,
}

impl Transaction {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an operation
    pub fn stage(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Stage removal of a roadmap's nodes and resources
    pub fn stage_clear_tree(&mut self, roadmap: RoadmapId) -> &mut Self {
        self.stage(WriteOp::DeleteNodes(roadmap))
            .stage(WriteOp::DeleteResources(roadmap))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Staged operations in order
    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    #[inline]
    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Discard staged work
    pub fn abort(self) {
        tracing::debug!(staged = self.ops.len(), "transaction aborted");
    }
}
