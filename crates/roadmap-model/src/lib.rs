//! Roadmap Model
//!
//! Records shared by every layer of the roadmap engine:
//! - [`Roadmap`]: the cached artifact with votes and regeneration history
//! - [`Node`]: tree payload, placed by construction so depth invariants hold
//! - [`Resource`]: leaf references owned by a roadmap
//! - closed vocabularies for category, difficulty, node and resource types

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod actor;
pub mod ids;
pub mod node;
pub mod resource;
pub mod roadmap;
pub mod vocab;

pub use actor::{Actor, Role};
pub use ids::{NodeId, ResourceId, RoadmapId, UserId};
pub use node::{EstimatedDuration, Node, NodeDraft, NodeMetadata};
pub use resource::{Resource, ResourceStats};
pub use roadmap::{slugify, RegenerationRecord, Roadmap, RoadmapStats};
pub use vocab::{Category, Difficulty, DurationUnit, Importance, NodeType, ResourceType, UnknownVariant};

/// Errors raised while constructing records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Title was empty after trimming
    #[error("roadmap title must not be empty")]
    EmptyTitle,
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
