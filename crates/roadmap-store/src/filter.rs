//! Roadmap query filters, ordering and grouping

use roadmap_model::{Category, Difficulty, Roadmap, UserId};
use serde::{Deserialize, Serialize};

/// Conjunctive roadmap filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadmapFilter {
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
    pub is_published: Option<bool>,
    pub is_pre_generated: Option<bool>,
    pub contributor: Option<UserId>,
    /// Case-insensitive substring of the title
    pub title_contains: Option<String>,
    /// Coarse keyword prefilter: keyword or tag overlap, or title/description
    /// containing any keyword. Empty means no keyword constraint.
    #[serde(default)]
    pub any_keyword: Vec<String>,
}

impl RoadmapFilter {
    /// Filter matching every roadmap
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Published roadmaps only
    #[inline]
    #[must_use]
    pub fn published() -> Self {
        Self {
            is_published: Some(true),
            ..Self::default()
        }
    }

    /// Keyword prefilter
    #[must_use]
    pub fn matching_any(keywords: &[String]) -> Self {
        Self {
            any_keyword: keywords.iter().map(|k| k.to_lowercase()).collect(),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_pre_generated(mut self, pre_generated: bool) -> Self {
        self.is_pre_generated = Some(pre_generated);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_published(mut self, published: bool) -> Self {
        self.is_published = Some(published);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_contributor(mut self, contributor: UserId) -> Self {
        self.contributor = Some(contributor);
        self
    }

    #[must_use]
    pub fn with_title_containing(mut self, needle: impl Into<String>) -> Self {
        self.title_contains = Some(needle.into().to_lowercase());
        self
    }

    /// Whether `roadmap` satisfies every set constraint
    #[must_use]
    pub fn matches(&self, roadmap: &Roadmap) -> bool {
        if self.category.is_some_and(|c| c != roadmap.category)
            || self.difficulty.is_some_and(|d| d != roadmap.difficulty)
            || self.is_published.is_some_and(|p| p != roadmap.is_published)
            || self.is_pre_generated.is_some_and(|p| p != roadmap.is_pre_generated)
            || self.contributor.is_some_and(|c| roadmap.contributor != Some(c))
        {
            return false;
        }

        if let Some(needle) = &self.title_contains {
            if !roadmap.title.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        self.any_keyword.is_empty() || self.keyword_hit(roadmap)
    }

    fn keyword_hit(&self, roadmap: &Roadmap) -> bool {
        let title = roadmap.title.to_lowercase();
        let description = roadmap.description.to_lowercase();
        self.any_keyword.iter().any(|keyword| {
            roadmap.search_keywords.iter().any(|k| k == keyword)
                || roadmap.tags.iter().any(|t| t == keyword)
                || title.contains(keyword.as_str())
                || description.contains(keyword.as_str())
        })
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first (storage order)
    #[default]
    Created,
    /// Most recently published first; unpublished last
    RecentlyPublished,
    /// Most viewed first, then most completed
    Popular,
}

/// Ordering and paging of a find
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: SortOrder,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    #[inline]
    #[must_use]
    pub fn sorted(sort: SortOrder) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort in place according to `self.sort`
    pub fn sort(&self, roadmaps: &mut [Roadmap]) {
        match self.sort {
            SortOrder::Created => roadmaps.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))),
            SortOrder::RecentlyPublished => roadmaps.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
            SortOrder::Popular => roadmaps.sort_by(|a, b| {
                b.stats
                    .views
                    .cmp(&a.stats.views)
                    .then(b.stats.completions.cmp(&a.stats.completions))
            }),
        }
    }
}

/// Field to group by in a count aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Category,
    Difficulty,
}

impl GroupKey {
    /// Group value of `roadmap`
    #[must_use]
    pub fn value_of(&self, roadmap: &Roadmap) -> &'static str {
        match self {
            Self::Category => roadmap.category.as_str(),
            Self::Difficulty => roadmap.difficulty.as_str(),
        }
    }
}

/// One bucket of a group-and-count aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    pub count: usize,
}
