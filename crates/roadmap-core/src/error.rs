//! Error types for the roadmap engine
//!
//! Every error here is `Clone`: a single generation failure is fanned out to all
//! callers waiting on the same in-flight request.

use roadmap_model::RoadmapId;
use roadmap_oracle::OracleError;
use roadmap_quality::QualityError;
use roadmap_store::StoreError;

/// Generation pipeline failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Prompt was empty after trimming
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// Oracle output missing required fields or outside structural bounds
    #[error("invalid generated roadmap: {0}")]
    Validation(String),

    /// Oracle unreachable or failing
    #[error("oracle failed: {0}")]
    Upstream(#[from] OracleError),

    /// Persistence failed; partial writes were rolled back
    #[error("storage failed: {0}")]
    Storage(#[from] StoreError),

    /// Waited too long for an identical in-flight generation
    #[error("timed out after {secs}s waiting for an identical generation")]
    FollowerTimeout { secs: u64 },

    /// In-flight generation ended without reporting a result
    #[error("in-flight generation was abandoned")]
    Abandoned,
}

impl GenerationError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(e) => e.is_retryable(),
            Self::FollowerTimeout { .. } | Self::Abandoned => true,
            Self::Storage(e) => e.is_conflict(),
            Self::EmptyPrompt | Self::Validation(_) => false,
        }
    }

    /// Validation error helper
    #[inline]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Vote failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoteError {
    #[error("roadmap not found: {0}")]
    NotFound(RoadmapId),

    /// Optimistic update kept losing to concurrent writers
    #[error("vote on {id} abandoned after {attempts} conflicting attempts")]
    Contention { id: RoadmapId, attempts: u32 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Regeneration failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegenerationError {
    #[error("roadmap not found: {0}")]
    NotFound(RoadmapId),

    /// Actor lacks the rights and the roadmap is not flagged
    #[error("regeneration not permitted: {0}")]
    NotPermitted(#[from] QualityError),

    /// Another regeneration of the same roadmap is running
    #[error("regeneration already in progress for {0}")]
    InProgress(RoadmapId),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Catalog (read/admin path) failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("roadmap not found: {0}")]
    NotFound(RoadmapId),

    /// Actor is neither owner nor admin (or not admin for admin-only actions)
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Edit would violate a record invariant
    #[error("invalid edit: {0}")]
    Invalid(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration load failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("cannot parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
