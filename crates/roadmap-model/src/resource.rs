//! Leaf learning resources owned by a node

use crate::ids::{ResourceId, RoadmapId, UserId};
use crate::vocab::{Difficulty, ResourceType};
use serde::{Deserialize, Serialize};

/// Engagement counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub views: u64,
    pub clicks: u64,
    pub upvotes: u64,
    pub downvotes: u64,
}

/// Learning resource
///
/// Owned by the roadmap it was generated for; deleted with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub roadmap: RoadmapId,
    pub title: String,
    pub url: String,
    pub description: String,
    pub resource_type: ResourceType,
    pub difficulty: Difficulty,
    pub is_approved: bool,
    pub contributor: Option<UserId>,
    #[serde(default)]
    pub stats: ResourceStats,
}

impl Resource {
    /// Create a resource owned by `roadmap`
    #[must_use]
    pub fn new(
        roadmap: RoadmapId,
        title: impl Into<String>,
        url: impl Into<String>,
        resource_type: ResourceType,
    ) -> Self {
        Self {
            id: ResourceId::new(),
            roadmap,
            title: title.into(),
            url: url.into(),
            description: String::new(),
            resource_type,
            difficulty: Difficulty::default(),
            is_approved: false,
            contributor: None,
            stats: ResourceStats::default(),
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With difficulty
    #[inline]
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// With approval flag and contributor
    #[inline]
    #[must_use]
    pub fn approved(mut self, is_approved: bool, contributor: Option<UserId>) -> Self {
        self.is_approved = is_approved;
        self.contributor = contributor;
        self
    }
}
