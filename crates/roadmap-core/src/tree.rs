//! Nested view of a roadmap's flat node list

use roadmap_model::{Node, NodeId};
use serde::Serialize;
use std::collections::HashMap;

/// Node with its ordered children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    #[inline]
    #[must_use]
    pub fn leaf(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Nodes in this subtree, including self
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Result of [`assemble`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Assembled {
    pub roots: Vec<TreeNode>,
    /// Nodes that could not be placed: missing parent, depth mismatch, duplicate
    /// id, or deeper than the limit
    pub orphans: Vec<Node>,
}

impl Assembled {
    /// Placed nodes
    #[must_use]
    pub fn placed(&self) -> usize {
        self.roots.iter().map(TreeNode::size).sum()
    }
}

/// Build the tree from flat nodes
///
/// The parent of a node is its first prerequisite. Nodes are visited in
/// ascending `(depth, position)`, so every parent is placed before its children
/// and siblings keep position order. Each id is placed at most once.
#[must_use]
pub fn assemble(mut nodes: Vec<Node>, max_depth: u32) -> Assembled {
    nodes.sort_by_key(|n| (n.depth, n.position));

    let mut placed: HashMap<NodeId, u32> = HashMap::with_capacity(nodes.len());
    let mut children: HashMap<NodeId, Vec<Node>> = HashMap::new();
    let mut roots = Vec::new();
    let mut orphans = Vec::new();

    for node in nodes {
        if placed.contains_key(&node.id) || node.depth >= max_depth {
            orphans.push(node);
            continue;
        }
        match node.parent() {
            None if node.depth == 0 => {
                placed.insert(node.id, 0);
                roots.push(node);
            }
            Some(parent) if placed.get(&parent).is_some_and(|d| d + 1 == node.depth) => {
                placed.insert(node.id, node.depth);
                children.entry(parent).or_default().push(node);
            }
            _ => orphans.push(node),
        }
    }

    let roots = roots.into_iter().map(|root| attach(root, &mut children)).collect();
    Assembled { roots, orphans }
}

// Recursion is bounded by `max_depth` since deeper nodes were orphaned above
fn attach(node: Node, children: &mut HashMap<NodeId, Vec<Node>>) -> TreeNode {
    let kids = children.remove(&node.id).unwrap_or_default();
    TreeNode {
        children: kids.into_iter().map(|kid| attach(kid, children)).collect(),
        node,
    }
}

/// Depth-first preorder list of every node in `roots`
#[must_use]
pub fn flatten(roots: &[TreeNode]) -> Vec<Node> {
    let mut out = Vec::new();
    let mut stack: Vec<&TreeNode> = roots.iter().rev().collect();
    while let Some(tree) = stack.pop() {
        out.push(tree.node.clone());
        stack.extend(tree.children.iter().rev());
    }
    out
}
