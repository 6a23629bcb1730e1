//! Roadmap (artifact) record
//!
//! A roadmap is the unit of caching: generated on demand or seeded, mutated by
//! votes, publishing and structural edits, and destroyed together with its nodes
//! and owned resources.

use crate::ids::{RoadmapId, UserId};
use crate::vocab::{Category, Difficulty};
use crate::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Usage counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadmapStats {
    pub views: u64,
    pub completions: u64,
    pub average_rating: f64,
    pub ratings_count: u64,
}

/// One entry of the append-only regeneration log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenerationRecord {
    pub regenerated_at: DateTime<Utc>,
    pub reason: String,
    pub previous_downvotes: usize,
}

/// Roadmap record
///
/// # Invariants
/// - `title` is non-empty
/// - a voter appears in at most one of `upvotes` / `downvotes` (kept by the vote
///   protocol, not by this type)
/// - `version` only grows
/// - `revision` is owned by the store and bumped on every successful write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub id: RoadmapId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub search_keywords: Vec<String>,
    pub version: u32,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub is_pre_generated: bool,
    pub is_community_contributed: bool,
    pub contributor: Option<UserId>,
    #[serde(default)]
    pub upvotes: BTreeSet<UserId>,
    #[serde(default)]
    pub downvotes: BTreeSet<UserId>,
    pub quality_score: f64,
    pub needs_regeneration: bool,
    #[serde(default)]
    pub regeneration_history: Vec<RegenerationRecord>,
    #[serde(default)]
    pub stats: RoadmapStats,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub updated_by: Option<UserId>,
    #[serde(default)]
    pub revision: u64,
}

impl Roadmap {
    /// Create an unpublished roadmap shell at version 1
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyTitle`] if the trimmed title is empty
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Result<Self, ModelError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ModelError::EmptyTitle);
        }
        let now = Utc::now();
        Ok(Self {
            id: RoadmapId::new(),
            slug: slugify(&title),
            title,
            description: description.into(),
            category: Category::default(),
            difficulty: Difficulty::default(),
            tags: Vec::new(),
            search_keywords: Vec::new(),
            version: 1,
            is_published: false,
            published_at: None,
            is_pre_generated: false,
            is_community_contributed: false,
            contributor: None,
            upvotes: BTreeSet::new(),
            downvotes: BTreeSet::new(),
            quality_score: 0.0,
            needs_regeneration: false,
            regeneration_history: Vec::new(),
            stats: RoadmapStats::default(),
            created_at: now,
            last_updated: now,
            updated_by: None,
            revision: 0,
        })
    }

    /// With category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// With difficulty
    #[inline]
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// With tags (lowercased, trimmed, empty tags dropped)
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    /// With precomputed search keywords
    #[inline]
    #[must_use]
    pub fn with_search_keywords(mut self, keywords: Vec<String>) -> Self {
        self.search_keywords = keywords;
        self
    }

    /// Mark as contributed by a community member
    #[inline]
    #[must_use]
    pub fn contributed_by(mut self, contributor: Option<UserId>, community: bool) -> Self {
        self.is_community_contributed = community;
        self.contributor = contributor;
        self
    }

    /// Mark as a seeded, published roadmap
    #[must_use]
    pub fn pre_generated(mut self) -> Self {
        self.is_pre_generated = true;
        self.is_published = true;
        self.published_at = Some(self.created_at);
        self
    }

    /// Whether `user` owns this roadmap
    #[inline]
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.contributor == Some(user)
    }

    /// Record a structural change: bump version and stamp the editor
    pub fn touch_structure(&mut self, editor: Option<UserId>) {
        self.version += 1;
        self.stamp(editor);
    }

    /// Stamp `last_updated` / `updated_by` without a version bump
    pub fn stamp(&mut self, editor: Option<UserId>) {
        self.last_updated = Utc::now();
        self.updated_by = editor;
    }

    /// Case-insensitive whole-title comparison
    #[must_use]
    pub fn title_matches(&self, title: &str) -> bool {
        self.title.trim().to_lowercase() == title.trim().to_lowercase()
    }
}

/// URL-friendly slug: lowercase alphanumerics separated by single dashes
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
