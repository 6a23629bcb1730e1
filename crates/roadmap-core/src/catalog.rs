//! Browsing and administering stored roadmaps

use crate::error::CatalogError;
use crate::normalize::GeneratedNode;
use crate::persist::{plan_tree, stage_new_roadmap, Attribution};
use crate::tree::{assemble, Assembled};
use chrono::Utc;
use roadmap_model::{
    slugify, Actor, Category, Difficulty, EstimatedDuration, Importance, Node, NodeId, NodeType,
    Resource, Roadmap, RoadmapId,
};
use roadmap_search::KeywordExtractor;
use roadmap_store::{
    FindOptions, GroupCount, GroupKey, RoadmapFilter, RoadmapStore, SortOrder, Transaction, WriteOp,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_POPULAR_LIMIT: usize = 20;

/// Published listing query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// 1-based; 0 is read as 1
    pub page: usize,
    /// 0 means [`DEFAULT_PAGE_SIZE`]
    pub limit: usize,
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
    /// Case-insensitive title substring
    pub search: Option<String>,
}

impl ListQuery {
    #[inline]
    #[must_use]
    pub fn page(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    fn filter(&self) -> RoadmapFilter {
        let mut filter = RoadmapFilter::published();
        filter.category = self.category;
        filter.difficulty = self.difficulty;
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => filter.with_title_containing(needle),
            _ => filter,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<T>,
}

/// Roadmap with its assembled tree and approved resources
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadmapDetail {
    pub roadmap: Roadmap,
    pub tree: Assembled,
    pub resources: Vec<Resource>,
}

/// Changes to a roadmap's descriptive fields; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailsEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
    pub tags: Option<Vec<String>>,
}

/// A hand-written roadmap with its tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRoadmap {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    /// Resources start unapproved
    pub community: bool,
    pub nodes: Vec<GeneratedNode>,
}

/// Changes to one stored node; `None` leaves a field as is
///
/// Placement (`depth`, `position`, edges) is not editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEdit {
    pub id: NodeId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub estimated_duration: Option<EstimatedDuration>,
    #[serde(default)]
    pub importance: Option<Importance>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl NodeEdit {
    #[must_use]
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            title: None,
            description: None,
            node_type: None,
            estimated_duration: None,
            importance: None,
            difficulty: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = Some(importance);
        self
    }

    fn apply(self, node: &mut Node) {
        if let Some(title) = self.title {
            node.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            node.description = description;
        }
        if let Some(node_type) = self.node_type {
            node.node_type = node_type;
        }
        if let Some(duration) = self.estimated_duration {
            node.estimated_duration = Some(duration);
        }
        if let Some(importance) = self.importance {
            node.metadata.importance = importance;
            node.is_optional = importance == Importance::Low;
        }
        if let Some(difficulty) = self.difficulty {
            node.metadata.difficulty = difficulty;
        }
    }
}

/// Outcome of a bulk node edit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodesUpdate {
    pub roadmap: Roadmap,
    /// Every node of the roadmap after the edit
    pub nodes: Vec<Node>,
    pub updated: usize,
    /// Edits naming no node of this roadmap
    pub unmatched: Vec<NodeId>,
    /// Edits the store rejected
    pub failed: Vec<NodeId>,
}

/// What a cascading delete removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub nodes: usize,
    pub resources: usize,
}

/// Read paths plus owner/admin maintenance
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn RoadmapStore>,
    extractor: KeywordExtractor,
    max_depth: u32,
}

impl Catalog {
    #[must_use]
    pub fn new(store: Arc<dyn RoadmapStore>, extractor: KeywordExtractor, max_depth: u32) -> Self {
        Self {
            store,
            extractor,
            max_depth,
        }
    }

    /// Published pre-generated roadmaps, most viewed first, then most completed
    ///
    /// # Errors
    /// Store failures
    pub async fn popular(&self, limit: usize) -> Result<Vec<Roadmap>, CatalogError> {
        let filter = RoadmapFilter::published().with_pre_generated(true);
        let options = FindOptions::sorted(SortOrder::Popular).with_limit(limit);
        Ok(self.store.find_roadmaps(&filter, options).await?)
    }

    /// Published roadmaps, most recently published first
    ///
    /// # Errors
    /// Store failures
    pub async fn list_published(&self, query: &ListQuery) -> Result<Page<Roadmap>, CatalogError> {
        let page = query.page.max(1);
        let limit = if query.limit == 0 { DEFAULT_PAGE_SIZE } else { query.limit };
        let filter = query.filter();

        let options = FindOptions::sorted(SortOrder::RecentlyPublished)
            .with_skip((page - 1) * limit)
            .with_limit(limit);
        let (total_items, items) = futures::try_join!(
            self.store.count_roadmaps(&filter),
            self.store.find_roadmaps(&filter, options)
        )?;

        Ok(Page {
            page,
            total_pages: total_items.div_ceil(limit),
            total_items,
            items,
        })
    }

    /// Roadmap with its tree and approved resources
    ///
    /// # Errors
    /// [`CatalogError::NotFound`] for an unknown roadmap
    pub async fn detail(&self, id: RoadmapId) -> Result<RoadmapDetail, CatalogError> {
        let roadmap = self.find(id).await?;
        let (nodes, resources) =
            futures::try_join!(self.store.find_nodes(id), self.store.find_resources(id))?;
        Ok(RoadmapDetail {
            roadmap,
            tree: assemble(nodes, self.max_depth),
            resources: resources.into_iter().filter(|r| r.is_approved).collect(),
        })
    }

    /// Publish or unpublish; administrators only
    ///
    /// # Errors
    /// [`CatalogError::Forbidden`] for non-admins
    pub async fn set_published(&self, id: RoadmapId, actor: &Actor, published: bool) -> Result<Roadmap, CatalogError> {
        if !actor.is_admin() {
            return Err(CatalogError::Forbidden("only administrators can publish roadmaps"));
        }
        let mut roadmap = self.find(id).await?;
        let expected = roadmap.revision;
        roadmap.is_published = published;
        roadmap.published_at = published.then(Utc::now);

        let roadmap = self.store.update_roadmap(roadmap, expected).await?;
        info!(roadmap = %id, published, "publication changed");
        Ok(roadmap)
    }

    /// Edit descriptive fields; owner or administrator
    ///
    /// A title change also refreshes the slug and search keywords. Every edit
    /// bumps `version`.
    ///
    /// # Errors
    /// [`CatalogError::Forbidden`] for other users, [`CatalogError::Invalid`]
    /// for an empty title
    pub async fn edit_details(&self, id: RoadmapId, actor: &Actor, edit: DetailsEdit) -> Result<Roadmap, CatalogError> {
        let mut roadmap = self.find(id).await?;
        Self::require_owner_or_admin(actor, &roadmap)?;
        let expected = roadmap.revision;

        let text_changed = edit.title.is_some() || edit.description.is_some();
        if let Some(title) = edit.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(CatalogError::Invalid("title must not be empty".into()));
            }
            roadmap.slug = slugify(&title);
            roadmap.title = title;
        }
        if let Some(description) = edit.description {
            roadmap.description = description;
        }
        if text_changed {
            roadmap.search_keywords = self
                .extractor
                .extract(&format!("{} {}", roadmap.title, roadmap.description));
        }
        if let Some(category) = edit.category {
            roadmap.category = category;
        }
        if let Some(difficulty) = edit.difficulty {
            roadmap.difficulty = difficulty;
        }
        if let Some(tags) = edit.tags {
            roadmap = roadmap.with_tags(tags);
        }
        roadmap.touch_structure(Some(actor.id));

        Ok(self.store.update_roadmap(roadmap, expected).await?)
    }

    /// Create a roadmap with its whole tree in one transaction
    ///
    /// `actor` becomes the contributor and owner. The tree is laid out the
    /// same way as a generated one.
    ///
    /// # Errors
    /// [`CatalogError::Invalid`] for an empty title or a tree deeper than the
    /// configured maximum
    pub async fn create_with_nodes(&self, actor: &Actor, new: NewRoadmap) -> Result<RoadmapDetail, CatalogError> {
        let height = new.nodes.iter().map(GeneratedNode::height).max().unwrap_or(0);
        if height > self.max_depth as usize + 1 {
            return Err(CatalogError::Invalid(format!(
                "tree is {height} levels deep, at most {} allowed",
                self.max_depth + 1
            )));
        }

        let keywords = self
            .extractor
            .extract(&format!("{} {}", new.title, new.description));
        let mut roadmap = Roadmap::new(new.title, new.description)
            .map_err(|e| CatalogError::Invalid(e.to_string()))?
            .with_category(new.category)
            .with_difficulty(new.difficulty)
            .with_tags(new.tags)
            .with_search_keywords(keywords)
            .contributed_by(Some(actor.id), new.community);
        roadmap.stamp(Some(actor.id));

        let attribution = Attribution {
            requester: Some(actor.id),
            community: new.community,
        };
        let plan = plan_tree(roadmap.id, &new.nodes, attribution);
        let nodes: Vec<Node> = plan.nodes().cloned().collect();
        let resources: Vec<Resource> = plan.resources().filter(|r| r.is_approved).cloned().collect();

        let receipts = self.store.commit(stage_new_roadmap(roadmap.clone(), plan)).await?;
        roadmap.revision = receipts.first().and_then(|r| r.revision).unwrap_or(1);
        info!(roadmap = %roadmap.id, nodes = nodes.len(), "roadmap created");

        Ok(RoadmapDetail {
            roadmap,
            tree: assemble(nodes, self.max_depth),
            resources,
        })
    }

    /// Edit stored nodes of a roadmap; owner or administrator
    ///
    /// The roadmap's `version` is bumped first, then every edit is written as
    /// its own op. An edit can only touch a node of roadmap `id`.
    ///
    /// # Errors
    /// [`CatalogError::Forbidden`] for other users, [`CatalogError::Invalid`]
    /// for an empty title (nothing is written)
    pub async fn update_nodes(&self, id: RoadmapId, actor: &Actor, edits: Vec<NodeEdit>) -> Result<NodesUpdate, CatalogError> {
        let mut roadmap = self.find(id).await?;
        Self::require_owner_or_admin(actor, &roadmap)?;
        if edits
            .iter()
            .any(|edit| edit.title.as_deref().is_some_and(|t| t.trim().is_empty()))
        {
            return Err(CatalogError::Invalid("node title must not be empty".into()));
        }

        let mut stored: HashMap<NodeId, Node> = self
            .store
            .find_nodes(id)
            .await?
            .into_iter()
            .map(|node| (node.id, node))
            .collect();
        let mut unmatched = Vec::new();
        let mut ops = Vec::with_capacity(edits.len());
        let mut targets = Vec::with_capacity(edits.len());
        for edit in edits {
            let Some(node) = stored.get_mut(&edit.id) else {
                unmatched.push(edit.id);
                continue;
            };
            edit.apply(node);
            node.updated_by = Some(actor.id);
            targets.push(node.id);
            ops.push(WriteOp::UpdateNode(node.clone()));
        }

        let expected = roadmap.revision;
        roadmap.touch_structure(Some(actor.id));
        let roadmap = self.store.update_roadmap(roadmap, expected).await?;

        let attempted = targets.len();
        let mut failed = Vec::new();
        for (outcome, node) in self.store.bulk_write(ops).await.into_iter().zip(targets) {
            if let Err(e) = outcome {
                warn!(roadmap = %id, %node, error = %e, "node update failed");
                failed.push(node);
            }
        }

        let nodes = self.store.find_nodes(id).await?;
        info!(roadmap = %id, version = roadmap.version, failed = failed.len(), "roadmap nodes updated");
        Ok(NodesUpdate {
            roadmap,
            nodes,
            updated: attempted - failed.len(),
            unmatched,
            failed,
        })
    }

    /// Delete a roadmap with its nodes and resources; owner or administrator
    ///
    /// # Errors
    /// [`CatalogError::Forbidden`] for other users
    pub async fn delete(&self, id: RoadmapId, actor: &Actor) -> Result<DeletionReport, CatalogError> {
        let roadmap = self.find(id).await?;
        Self::require_owner_or_admin(actor, &roadmap)?;

        let mut tx = Transaction::new();
        tx.stage_clear_tree(id).stage(WriteOp::DeleteRoadmap(id));
        let receipts = self.store.commit(tx).await?;

        let report = DeletionReport {
            nodes: receipts.first().map_or(0, |r| r.affected),
            resources: receipts.get(1).map_or(0, |r| r.affected),
        };
        info!(roadmap = %id, nodes = report.nodes, resources = report.resources, "roadmap deleted");
        Ok(report)
    }

    /// Published roadmaps per category, largest first
    ///
    /// # Errors
    /// Store failures
    pub async fn category_stats(&self) -> Result<Vec<GroupCount>, CatalogError> {
        Ok(self
            .store
            .group_count(&RoadmapFilter::published(), GroupKey::Category)
            .await?)
    }

    async fn find(&self, id: RoadmapId) -> Result<Roadmap, CatalogError> {
        self.store.find_roadmap(id).await?.ok_or(CatalogError::NotFound(id))
    }

    fn require_owner_or_admin(actor: &Actor, roadmap: &Roadmap) -> Result<(), CatalogError> {
        if actor.is_admin() || roadmap.is_owned_by(actor.id) {
            Ok(())
        } else {
            Err(CatalogError::Forbidden("only the owner or an administrator can change this roadmap"))
        }
    }
}
