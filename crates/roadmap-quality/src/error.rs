//! Quality policy errors

use crate::state::QualityState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualityError {
    /// State change not allowed by the regeneration lifecycle
    #[error("illegal quality transition: {from:?} -> {to:?}")]
    IllegalTransition { from: QualityState, to: QualityState },

    /// Actor may not regenerate this roadmap
    #[error("roadmap does not need regeneration and actor is neither admin nor owner")]
    NotPermitted,

    /// Unrecognized vote direction
    #[error("unknown vote direction: {0}")]
    UnknownVote(String),
}
