//! Store errors

use roadmap_model::RoadmapId;

/// Store operation failure
///
/// Cloneable so a single failure can be reported to every waiter of a shared
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Record with the same id already stored
    #[error("duplicate {kind}: {id}")]
    Duplicate { kind: &'static str, id: String },

    /// Optimistic concurrency check failed
    #[error("revision conflict on roadmap {id}: expected {expected}, found {actual}")]
    Conflict {
        id: RoadmapId,
        expected: u64,
        actual: u64,
    },

    /// Transaction rolled back; nothing was applied
    #[error("transaction aborted at op {index}: {reason}")]
    TransactionAborted { index: usize, reason: String },

    /// Snapshot could not be read or written
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Backend failure (connection, injected fault, ...)
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Not-found error for a roadmap
    #[inline]
    #[must_use]
    pub fn roadmap_not_found(id: RoadmapId) -> Self {
        Self::NotFound {
            kind: "roadmap",
            id: id.to_string(),
        }
    }

    /// Whether a retry with fresh state may succeed
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
