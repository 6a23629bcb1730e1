//! Roadmap Core
//!
//! Deduplicating learning-roadmap engine:
//! - [`Pipeline`]: exact, fuzzy, redirect and single-flight lookups in front of
//!   transactional oracle generation
//! - [`VoteService`]: optimistic vote toggles feeding the quality state
//! - [`RegenerationService`]: transactional tree replacement, one per roadmap
//! - [`Catalog`]: listings, detail trees, publishing, edits and deletes
//! - [`Seeder`]: popular pre-generated roadmaps
//!
//! [`RoadmapEngine`] wires all of them from an [`EngineConfig`].

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod lookup;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod progress;
pub mod regeneration;
pub mod seed;
pub mod single_flight;
pub mod tree;
pub mod votes;

pub use catalog::{
    Catalog, DeletionReport, DetailsEdit, ListQuery, NewRoadmap, NodeEdit, NodesUpdate, Page, RoadmapDetail,
};
pub use config::{EngineConfig, OracleConfig, PipelineConfig, QualityConfig, SearchConfig};
pub use engine::RoadmapEngine;
pub use error::{CatalogError, ConfigError, GenerationError, RegenerationError, VoteError};
pub use generator::Generator;
pub use lookup::Lookup;
pub use normalize::{parse_generated, GeneratedNode, GeneratedResource, GeneratedRoadmap, TreeLimits};
pub use persist::{plan_tree, stage_new_roadmap, Attribution, TreePlan};
pub use pipeline::{GenerateRequest, GenerationOutcome, OutcomeSource, Pipeline};
pub use progress::{NullSink, ProgressEvent, ProgressHub, ProgressSink, ProgressStep, SubscriberId};
pub use regeneration::{RegenerationReport, RegenerationService};
pub use seed::{SeedReport, SeedRoadmap, Seeder, POPULAR_ROADMAPS};
pub use single_flight::{Flight, FlightGuard, SingleFlight};
pub use tree::{assemble, flatten, Assembled, TreeNode};
pub use votes::VoteService;

/// Commonly used types
pub mod prelude {
    pub use crate::{
        EngineConfig, GenerateRequest, GenerationError, GenerationOutcome, OutcomeSource, RoadmapEngine,
    };
    pub use roadmap_model::{Actor, Category, Difficulty, Node, Roadmap, RoadmapId, UserId};
    pub use roadmap_quality::Vote;
    pub use roadmap_store::{MemoryStore, RoadmapStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
