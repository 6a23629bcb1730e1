//! Oracle response parsing and normalization
//!
//! The oracle's JSON is read leniently: only `title`, `category` and `nodes` are
//! required. Every other field is normalized into the closed vocabularies with a
//! default instead of failing. Tree depth and size are bounded so a runaway or
//! self-similar response cannot blow up persistence.

use crate::error::GenerationError;
use roadmap_model::{
    Category, Difficulty, DurationUnit, EstimatedDuration, Importance, NodeType, ResourceType,
};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Raw wire shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoadmap {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    difficulty: Option<String>,
    nodes: Option<Vec<RawNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    title: Option<String>,
    description: Option<String>,
    node_type: Option<String>,
    estimated_duration: Option<RawDuration>,
    importance: Option<String>,
    difficulty: Option<String>,
    #[serde(default)]
    resources: Vec<RawResource>,
    #[serde(default)]
    children: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawDuration {
    value: Option<f64>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    title: Option<String>,
    url: Option<String>,
    resource_type: Option<String>,
    description: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalized shape
// ---------------------------------------------------------------------------

/// Validated roadmap returned by the oracle
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRoadmap {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub nodes: Vec<GeneratedNode>,
}

impl GeneratedRoadmap {
    /// Total nodes in the tree
    #[must_use]
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[GeneratedNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.children)).sum()
        }
        count(&self.nodes)
    }
}

/// Node of a tree about to be persisted, from the oracle or written by hand
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedNode {
    pub title: String,
    pub description: String,
    pub node_type: NodeType,
    pub estimated_duration: Option<EstimatedDuration>,
    pub importance: Importance,
    pub difficulty: Difficulty,
    pub resources: Vec<GeneratedResource>,
    pub children: Vec<GeneratedNode>,
}

impl GeneratedNode {
    /// Topic node with defaults elsewhere
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            node_type: NodeType::default(),
            estimated_duration: None,
            importance: Importance::default(),
            difficulty: Difficulty::default(),
            resources: Vec::new(),
            children: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_resource(mut self, resource: GeneratedResource) -> Self {
        self.resources.push(resource);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_children(mut self, children: Vec<GeneratedNode>) -> Self {
        self.children = children;
        self
    }

    /// Levels below and including this node
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            height = height.max(level);
            stack.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResource {
    pub title: String,
    pub url: String,
    pub resource_type: ResourceType,
    pub description: String,
}

/// Structural bounds on a generated tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_nodes: 400,
        }
    }
}

// ---------------------------------------------------------------------------
// Field normalization
// ---------------------------------------------------------------------------

/// Map free-form category text into the closed set
///
/// Loose aliases win over exact matches: anything mentioning "front" or "ui" is
/// frontend, "back" is backend, "data" is data-science, "security" is
/// cybersecurity. Unknown values become `other`.
#[must_use]
pub fn normalize_category(raw: &str) -> Category {
    let lower = raw.trim().to_lowercase();
    if lower.contains("front") || lower.contains("ui") {
        Category::Frontend
    } else if lower.contains("back") {
        Category::Backend
    } else if lower.contains("data") {
        Category::DataScience
    } else if lower.contains("security") {
        Category::Cybersecurity
    } else {
        lower.parse().unwrap_or(Category::Other)
    }
}

fn parse_or_default<T>(raw: Option<&str>) -> T
where
    T: std::str::FromStr + Default,
{
    raw.and_then(|s| s.parse().ok()).unwrap_or_default()
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn normalize_duration(raw: Option<RawDuration>) -> Option<EstimatedDuration> {
    let raw = raw?;
    let value = raw.value.filter(|v| v.is_finite() && *v > 0.0)?;
    let unit = raw
        .unit
        .as_deref()
        .and_then(|u| u.parse::<DurationUnit>().ok())
        .unwrap_or(DurationUnit::Hours);
    Some(EstimatedDuration { value, unit })
}

fn normalize_resource(raw: RawResource) -> Option<GeneratedResource> {
    let title = non_empty(raw.title)?;
    let url = non_empty(raw.url)?;
    Some(GeneratedResource {
        title,
        url,
        resource_type: parse_or_default(raw.resource_type.as_deref()),
        description: raw.description.unwrap_or_default(),
    })
}

struct Walker {
    limits: TreeLimits,
    seen: usize,
}

impl Walker {
    fn nodes(&mut self, raw: Vec<RawNode>, depth: usize) -> Result<Vec<GeneratedNode>, GenerationError> {
        if !raw.is_empty() && depth >= self.limits.max_depth {
            return Err(GenerationError::validation(format!(
                "node tree deeper than {} levels",
                self.limits.max_depth
            )));
        }

        let mut out = Vec::with_capacity(raw.len());
        for (index, node) in raw.into_iter().enumerate() {
            self.seen += 1;
            if self.seen > self.limits.max_nodes {
                return Err(GenerationError::validation(format!(
                    "node tree larger than {} nodes",
                    self.limits.max_nodes
                )));
            }

            let title = non_empty(node.title).ok_or_else(|| {
                GenerationError::validation(format!("node {index} at depth {depth} has no title"))
            })?;

            out.push(GeneratedNode {
                title,
                description: node.description.unwrap_or_default(),
                node_type: parse_or_default(node.node_type.as_deref()),
                estimated_duration: normalize_duration(node.estimated_duration),
                importance: parse_or_default(node.importance.as_deref()),
                difficulty: parse_or_default(node.difficulty.as_deref()),
                resources: node.resources.into_iter().filter_map(normalize_resource).collect(),
                children: self.nodes(node.children, depth + 1)?,
            });
        }
        Ok(out)
    }
}

/// Parse and normalize raw oracle text
///
/// # Errors
/// [`GenerationError::Validation`] if the text is not a JSON object, lacks
/// `title`, `category` or `nodes`, has an untitled node, or exceeds `limits`
pub fn parse_generated(text: &str, limits: TreeLimits) -> Result<GeneratedRoadmap, GenerationError> {
    let raw: RawRoadmap = serde_json::from_str(text.trim())
        .map_err(|e| GenerationError::validation(format!("response is not a roadmap object: {e}")))?;

    let title = non_empty(raw.title).ok_or_else(|| GenerationError::validation("missing title"))?;
    let category = non_empty(raw.category).ok_or_else(|| GenerationError::validation("missing category"))?;
    let nodes = raw.nodes.ok_or_else(|| GenerationError::validation("missing nodes"))?;
    if nodes.is_empty() {
        return Err(GenerationError::validation("roadmap has no nodes"));
    }

    let mut walker = Walker { limits, seen: 0 };
    Ok(GeneratedRoadmap {
        title,
        description: raw.description.unwrap_or_default(),
        category: normalize_category(&category),
        difficulty: parse_or_default(raw.difficulty.as_deref()),
        nodes: walker.nodes(nodes, 0)?,
    })
}
