//! Turning a generated tree into store writes
//!
//! [`plan_tree`] walks the generated tree depth-first and produces the ordered
//! writes for one roadmap: each node's resources come right before the node, and
//! `position` is a single counter across the whole walk. Plans are only ever
//! staged into a transaction: behind a new roadmap record ([`stage_new_roadmap`])
//! or in place of an existing tree (regeneration), so readers never see a
//! partial tree.

use crate::normalize::GeneratedNode;
use roadmap_model::{
    Node, NodeDraft, NodeId, NodeMetadata, NodeType, Resource, Roadmap, RoadmapId, UserId,
};
use roadmap_store::{Transaction, WriteOp};

/// Who the generated records are attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub requester: Option<UserId>,
    /// Community contributions start unapproved
    pub community: bool,
}

/// Ordered writes for one roadmap's tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreePlan {
    ops: Vec<WriteOp>,
}

impl TreePlan {
    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Planned nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.ops.iter().filter_map(|op| match op {
            WriteOp::InsertNode(node) => Some(node),
            _ => None,
        })
    }

    /// Planned resources in creation order
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.ops.iter().filter_map(|op| match op {
            WriteOp::InsertResource(resource) => Some(resource),
            _ => None,
        })
    }

    /// Stage every write into `tx`
    pub fn stage_into(self, tx: &mut Transaction) {
        for op in self.ops {
            tx.stage(op);
        }
    }
}

struct Frame<'a> {
    node: &'a GeneratedNode,
    parent: Option<Node>,
    dependencies: Vec<NodeId>,
}

/// Plan the writes for `nodes` under `roadmap`
///
/// Children of a milestone depend on that milestone; other children inherit
/// their parent's dependencies.
#[must_use]
pub fn plan_tree(roadmap: RoadmapId, nodes: &[GeneratedNode], attribution: Attribution) -> TreePlan {
    let mut ops = Vec::new();
    let mut position: u32 = 0;

    // Explicit stack, children pushed in reverse so siblings pop in order
    let mut stack: Vec<Frame<'_>> = nodes
        .iter()
        .rev()
        .map(|node| Frame {
            node,
            parent: None,
            dependencies: Vec::new(),
        })
        .collect();

    while let Some(Frame {
        node: generated,
        parent,
        dependencies,
    }) = stack.pop()
    {
        let resources: Vec<Resource> = generated
            .resources
            .iter()
            .map(|r| {
                Resource::new(roadmap, r.title.clone(), r.url.clone(), r.resource_type)
                    .with_description(r.description.clone())
                    .with_difficulty(generated.difficulty)
                    .approved(!attribution.community, attribution.requester)
            })
            .collect();

        let draft = NodeDraft {
            title: generated.title.clone(),
            description: generated.description.clone(),
            node_type: generated.node_type,
            estimated_duration: generated.estimated_duration,
            metadata: NodeMetadata {
                keywords: Vec::new(),
                difficulty: generated.difficulty,
                importance: generated.importance,
            },
            resources: resources.iter().map(|r| r.id).collect(),
        };

        let node = match &parent {
            Some(parent) => Node::child_of(parent, position, dependencies.clone(), draft),
            None => Node::root(roadmap, position, draft),
        }
        .edited_by(attribution.requester);
        position += 1;

        let child_dependencies = if node.node_type == NodeType::Milestone {
            vec![node.id]
        } else {
            dependencies
        };
        for child in generated.children.iter().rev() {
            stack.push(Frame {
                node: child,
                parent: Some(node.clone()),
                dependencies: child_dependencies.clone(),
            });
        }

        ops.extend(resources.into_iter().map(WriteOp::InsertResource));
        ops.push(WriteOp::InsertNode(node));
    }

    TreePlan { ops }
}

/// Stage a new roadmap record followed by its tree
///
/// The record is the first op, so a commit receipt's first entry carries its
/// revision.
pub fn stage_new_roadmap(roadmap: Roadmap, plan: TreePlan) -> Transaction {
    let mut tx = Transaction::new();
    tx.stage(WriteOp::InsertRoadmap(roadmap));
    plan.stage_into(&mut tx);
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::GeneratedResource;
    use roadmap_model::{Difficulty, Importance, ResourceType};
    use roadmap_store::{MemoryStore, RoadmapStore, StoreError};

    fn generated(title: &str, node_type: NodeType, children: Vec<GeneratedNode>) -> GeneratedNode {
        GeneratedNode {
            title: title.into(),
            description: String::new(),
            node_type,
            estimated_duration: None,
            importance: Importance::Medium,
            difficulty: Difficulty::Intermediate,
            resources: vec![GeneratedResource {
                title: format!("{title} docs"),
                url: format!("https://example.com/{title}"),
                resource_type: ResourceType::Documentation,
                description: String::new(),
            }],
            children,
        }
    }

    fn sample() -> Vec<GeneratedNode> {
        vec![
            generated(
                "M",
                NodeType::Milestone,
                vec![
                    generated("M1", NodeType::Topic, vec![generated("M1a", NodeType::Skill, vec![])]),
                    generated("M2", NodeType::Topic, vec![]),
                ],
            ),
            generated("T", NodeType::Topic, vec![generated("T1", NodeType::Topic, vec![])]),
        ]
    }

    #[test]
    fn depth_first_order_with_resources_first() {
        let roadmap = RoadmapId::new();
        let plan = plan_tree(roadmap, &sample(), Attribution { requester: None, community: false });

        let titles: Vec<_> = plan.nodes().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["M", "M1", "M1a", "M2", "T", "T1"]);
        let positions: Vec<_> = plan.nodes().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4, 5]);

        // each node is immediately preceded by its own resource
        for (i, op) in plan.ops().iter().enumerate() {
            if let WriteOp::InsertNode(node) = op {
                let WriteOp::InsertResource(resource) = &plan.ops()[i - 1] else {
                    panic!("node {} not preceded by a resource", node.title);
                };
                assert_eq!(node.resources, vec![resource.id]);
                assert_eq!(resource.difficulty, Difficulty::Intermediate);
            }
        }
    }

    #[test]
    fn depth_and_edges() {
        let plan = plan_tree(RoadmapId::new(), &sample(), Attribution { requester: None, community: false });
        let nodes: Vec<&Node> = plan.nodes().collect();
        let by_title = |t: &str| nodes.iter().find(|n| n.title == t).copied().unwrap();

        let m = by_title("M");
        let m1 = by_title("M1");
        let m1a = by_title("M1a");
        let t1 = by_title("T1");

        assert!(m.is_root() && m.depth == 0);
        assert_eq!((m1.depth, m1.parent()), (1, Some(m.id)));
        assert_eq!((m1a.depth, m1a.parent()), (2, Some(m1.id)));
        // milestone children depend on it, grandchildren inherit
        assert_eq!(m1.dependencies, vec![m.id]);
        assert_eq!(m1a.dependencies, vec![m.id]);
        assert!(t1.dependencies.is_empty());
    }

    #[test]
    fn community_resources_start_unapproved() {
        let requester = UserId::new();
        let plan = plan_tree(
            RoadmapId::new(),
            &sample(),
            Attribution { requester: Some(requester), community: true },
        );
        assert!(plan.resources().all(|r| !r.is_approved && r.contributor == Some(requester)));
        assert!(plan.nodes().all(|n| n.updated_by == Some(requester)));
    }

    #[tokio::test]
    async fn new_roadmap_commits_shell_and_tree_together() {
        let store = MemoryStore::new();
        let shell = Roadmap::new("Go", "").unwrap();
        let id = shell.id;
        let plan = plan_tree(id, &sample(), Attribution { requester: None, community: false });

        let tx = stage_new_roadmap(shell, plan);
        assert_eq!(tx.ops()[0].label(), "insert_roadmap");
        let receipts = store.commit(tx).await.unwrap();

        assert_eq!(receipts[0].revision, Some(1));
        assert!(store.find_roadmap(id).await.unwrap().is_some());
        assert_eq!(store.find_nodes(id).await.unwrap().len(), 6);
        assert_eq!(store.find_resources(id).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn failed_commit_leaves_no_shell() {
        let store = MemoryStore::new();
        let shell = store.insert_roadmap(Roadmap::new("Taken", "").unwrap()).await.unwrap();
        let plan = plan_tree(shell.id, &sample(), Attribution { requester: None, community: false });

        // same id again: the insert fails and nothing of the tree lands
        let err = store.commit(stage_new_roadmap(shell.clone(), plan)).await.unwrap_err();
        assert!(matches!(err, StoreError::TransactionAborted { index: 0, .. }));
        assert!(store.find_nodes(shell.id).await.unwrap().is_empty());
        assert!(store.find_resources(shell.id).await.unwrap().is_empty());
    }
}
