//! Vote toggling and quality score
//!
//! A voter sits in at most one of `upvotes` / `downvotes`. Casting a vote removes
//! the voter from the opposite set; casting the same vote again withdraws it.
//! Score and degraded flag are recomputed on every vote.

use crate::error::QualityError;
use roadmap_model::{Roadmap, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default downvote count at which a roadmap is flagged for regeneration
pub const DEFAULT_DOWNVOTE_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

impl FromStr for Vote {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "upvote" => Ok(Self::Up),
            "down" | "downvote" => Ok(Self::Down),
            other => Err(QualityError::UnknownVote(other.to_string())),
        }
    }
}

/// What a cast did to the voter's standing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteEffect {
    /// New vote recorded
    Cast,
    /// Opposite vote replaced
    Switched,
    /// Same vote withdrawn
    Withdrawn,
}

/// Counters after a vote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    pub effect: VoteEffect,
    pub upvotes: usize,
    pub downvotes: usize,
    pub quality_score: f64,
    pub needs_regeneration: bool,
}

/// Downvote threshold policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityPolicy {
    pub downvote_threshold: usize,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            downvote_threshold: DEFAULT_DOWNVOTE_THRESHOLD,
        }
    }
}

impl QualityPolicy {
    #[inline]
    #[must_use]
    pub fn with_threshold(downvote_threshold: usize) -> Self {
        Self { downvote_threshold }
    }

    /// Whether `downvotes` reaches the regeneration threshold
    #[inline]
    #[must_use]
    pub fn is_degraded(&self, downvotes: usize) -> bool {
        downvotes >= self.downvote_threshold
    }

    /// Toggle `voter`'s vote on `roadmap` and recompute derived fields
    pub fn apply_vote(&self, roadmap: &mut Roadmap, voter: UserId, vote: Vote) -> VoteTally {
        let (same, opposite) = match vote {
            Vote::Up => (&mut roadmap.upvotes, &mut roadmap.downvotes),
            Vote::Down => (&mut roadmap.downvotes, &mut roadmap.upvotes),
        };

        let switched = opposite.remove(&voter);
        let effect = if same.remove(&voter) {
            VoteEffect::Withdrawn
        } else {
            same.insert(voter);
            if switched {
                VoteEffect::Switched
            } else {
                VoteEffect::Cast
            }
        };

        self.refresh(roadmap);
        VoteTally {
            effect,
            upvotes: roadmap.upvotes.len(),
            downvotes: roadmap.downvotes.len(),
            quality_score: roadmap.quality_score,
            needs_regeneration: roadmap.needs_regeneration,
        }
    }

    /// Recompute `quality_score` and `needs_regeneration` from the voter sets
    pub fn refresh(&self, roadmap: &mut Roadmap) {
        roadmap.quality_score = quality_score(roadmap.upvotes.len(), roadmap.downvotes.len());
        roadmap.needs_regeneration = self.is_degraded(roadmap.downvotes.len());
    }
}

/// `100 * up / (up + down)` rounded to two decimals; zero without votes
#[must_use]
pub fn quality_score(upvotes: usize, downvotes: usize) -> f64 {
    let total = upvotes + downvotes;
    if total == 0 {
        return 0.0;
    }
    let raw = 100.0 * upvotes as f64 / total as f64;
    (raw * 100.0).round() / 100.0
}
