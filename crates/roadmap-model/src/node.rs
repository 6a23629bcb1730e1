//! Roadmap nodes
//!
//! Nodes form the tree payload of a roadmap. The canonical structural edge is
//! `prerequisites`: a child carries exactly one entry, its immediate parent.
//! `dependencies` are secondary unlocking links to a milestone ancestor and never
//! shape the tree.

use crate::ids::{NodeId, ResourceId, RoadmapId, UserId};
use crate::vocab::{Difficulty, DurationUnit, Importance, NodeType};
use serde::{Deserialize, Serialize};

/// Estimated time to complete a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedDuration {
    pub value: f64,
    pub unit: DurationUnit,
}

/// Search/ranking metadata carried by a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default)]
    pub keywords: Vec<String>,
    pub difficulty: Difficulty,
    pub importance: Importance,
}

/// Node content supplied by a caller; placement is decided by [`Node::root`] or
/// [`Node::child_of`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDraft {
    pub title: String,
    pub description: String,
    pub node_type: NodeType,
    pub estimated_duration: Option<EstimatedDuration>,
    pub metadata: NodeMetadata,
    pub resources: Vec<ResourceId>,
}

impl NodeDraft {
    /// Draft with a title and defaults elsewhere
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// With node type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }
}

/// Persisted roadmap node
///
/// # Invariants
/// - `prerequisites` is empty iff the node is a root
/// - when a parent exists, `depth == parent.depth + 1`
///
/// Both hold by construction: the only constructors are [`Node::root`] and
/// [`Node::child_of`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub roadmap: RoadmapId,
    pub title: String,
    pub description: String,
    pub depth: u32,
    pub position: u32,
    pub node_type: NodeType,
    pub estimated_duration: Option<EstimatedDuration>,
    pub is_optional: bool,
    #[serde(default)]
    pub resources: Vec<ResourceId>,
    #[serde(default)]
    pub prerequisites: Vec<NodeId>,
    #[serde(default)]
    pub dependencies: Vec<NodeId>,
    pub metadata: NodeMetadata,
    pub updated_by: Option<UserId>,
}

impl Node {
    /// Create a root node (depth 0, no prerequisites)
    #[must_use]
    pub fn root(roadmap: RoadmapId, position: u32, draft: NodeDraft) -> Self {
        Self::place(roadmap, 0, position, Vec::new(), Vec::new(), draft)
    }

    /// Create a child of `parent`; depth and prerequisite edge are derived from it
    #[must_use]
    pub fn child_of(parent: &Node, position: u32, dependencies: Vec<NodeId>, draft: NodeDraft) -> Self {
        Self::place(
            parent.roadmap,
            parent.depth + 1,
            position,
            vec![parent.id],
            dependencies,
            draft,
        )
    }

    fn place(
        roadmap: RoadmapId,
        depth: u32,
        position: u32,
        prerequisites: Vec<NodeId>,
        dependencies: Vec<NodeId>,
        draft: NodeDraft,
    ) -> Self {
        Self {
            id: NodeId::new(),
            roadmap,
            title: draft.title,
            description: draft.description,
            depth,
            position,
            node_type: draft.node_type,
            estimated_duration: draft.estimated_duration,
            is_optional: draft.metadata.importance == Importance::Low,
            resources: draft.resources,
            prerequisites,
            dependencies,
            metadata: draft.metadata,
            updated_by: None,
        }
    }

    /// Structural parent (first prerequisite)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.prerequisites.first().copied()
    }

    /// Whether this node is a tree root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.prerequisites.is_empty()
    }

    /// With editor stamp
    #[inline]
    #[must_use]
    pub fn edited_by(mut self, editor: Option<UserId>) -> Self {
        self.updated_by = editor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_depth_follows_parent() {
        let roadmap = RoadmapId::new();
        let root = Node::root(roadmap, 0, NodeDraft::titled("Basics"));
        let child = Node::child_of(&root, 1, Vec::new(), NodeDraft::titled("Syntax"));
        let grandchild = Node::child_of(&child, 2, Vec::new(), NodeDraft::titled("Macros"));

        assert!(root.is_root());
        assert_eq!(root.depth, 0);
        assert_eq!(child.depth, 1);
        assert_eq!(grandchild.depth, 2);
        assert_eq!(grandchild.parent(), Some(child.id));
        assert_eq!(grandchild.roadmap, roadmap);
    }

    #[test]
    fn low_importance_is_optional() {
        let mut draft = NodeDraft::titled("Trivia");
        draft.metadata.importance = Importance::Low;
        let node = Node::root(RoadmapId::new(), 0, draft);
        assert!(node.is_optional);
    }

    #[test]
    fn dependencies_do_not_affect_parent() {
        let root = Node::root(RoadmapId::new(), 0, NodeDraft::titled("M").with_type(NodeType::Milestone));
        let other = Node::root(root.roadmap, 1, NodeDraft::titled("Other"));
        let child = Node::child_of(&other, 2, vec![root.id], NodeDraft::titled("C"));
        assert_eq!(child.parent(), Some(other.id));
        assert_eq!(child.dependencies, vec![root.id]);
    }
}
