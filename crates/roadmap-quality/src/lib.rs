//! Roadmap Quality
//!
//! Community votes drive each roadmap through a small lifecycle:
//! - [`vote`]: toggle protocol, quality score, downvote threshold
//! - [`state`]: `Fresh -> Degraded -> Regenerating -> Fresh` transitions
//! - [`gate`]: regeneration authorization and history reasons

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod gate;
pub mod state;
pub mod vote;

pub use error::QualityError;
pub use gate::RegenerationGrant;
pub use state::{allowed_transitions, validate_transition, QualityState};
pub use vote::{quality_score, QualityPolicy, Vote, VoteEffect, VoteTally, DEFAULT_DOWNVOTE_THRESHOLD};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
