//! Regeneration lifecycle
//!
//! `Fresh -> Degraded -> Regenerating -> Fresh`. A forced regeneration skips
//! `Degraded`; a failed one falls back to whatever state the roadmap was in, and
//! votes can lift a degraded roadmap back to fresh.

use roadmap_model::Roadmap;
use serde::{Deserialize, Serialize};

use crate::error::QualityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityState {
    /// Served from cache
    Fresh,
    /// Downvote threshold reached; halved in ranking, never returned by fuzzy lookup
    Degraded,
    /// Tree being replaced
    Regenerating,
}

impl QualityState {
    /// Persisted state of `roadmap` (regeneration is tracked outside the record)
    #[inline]
    #[must_use]
    pub fn of(roadmap: &Roadmap) -> Self {
        if roadmap.needs_regeneration {
            Self::Degraded
        } else {
            Self::Fresh
        }
    }
}

#[must_use]
pub fn allowed_transitions(from: QualityState) -> Vec<QualityState> {
    use QualityState::*;
    match from {
        Fresh => vec![Degraded, Regenerating],
        Degraded => vec![Fresh, Regenerating],
        Regenerating => vec![Fresh, Degraded],
    }
}

/// Validate a lifecycle transition
///
/// # Errors
/// [`QualityError::IllegalTransition`] for self-loops and anything not listed in
/// [`allowed_transitions`]
pub fn validate_transition(from: QualityState, to: QualityState) -> Result<(), QualityError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(QualityError::IllegalTransition { from, to })
    }
}
