//! Engine facade wiring the services over shared store and oracle handles

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::{ConfigError, GenerationError, RegenerationError, VoteError};
use crate::generator::Generator;
use crate::lookup::Lookup;
use crate::normalize::TreeLimits;
use crate::pipeline::{GenerateRequest, GenerationOutcome, Pipeline};
use crate::progress::{NullSink, ProgressSink};
use crate::regeneration::{RegenerationReport, RegenerationService};
use crate::seed::Seeder;
use crate::votes::VoteService;
use roadmap_model::{Actor, RoadmapId, UserId};
use roadmap_oracle::Oracle;
use roadmap_quality::{Vote, VoteTally};
use roadmap_search::{KeywordExtractor, SimilarityMatcher};
use roadmap_store::RoadmapStore;
use std::sync::Arc;

/// Roadmap engine
///
/// Built once at startup; cheap to clone and share across tasks.
#[derive(Clone)]
pub struct RoadmapEngine {
    config: EngineConfig,
    store: Arc<dyn RoadmapStore>,
    pipeline: Pipeline,
    lookup: Lookup,
    votes: VoteService,
    regeneration: RegenerationService,
    catalog: Catalog,
    seeder: Seeder,
}

impl RoadmapEngine {
    /// Wire an engine without progress reporting
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if `config` fails validation
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn RoadmapStore>,
        oracle: Arc<dyn Oracle>,
    ) -> Result<Self, ConfigError> {
        Self::with_progress(config, store, oracle, Arc::new(NullSink))
    }

    /// Wire an engine reporting progress to `sink`
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if `config` fails validation
    pub fn with_progress(
        config: EngineConfig,
        store: Arc<dyn RoadmapStore>,
        oracle: Arc<dyn Oracle>,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let extractor = KeywordExtractor::new(config.search.max_keywords);
        let matcher = SimilarityMatcher::new(config.search.weights);
        let limits = TreeLimits {
            max_depth: config.pipeline.max_tree_depth,
            max_nodes: config.pipeline.max_tree_nodes,
        };
        let max_depth = u32::try_from(config.pipeline.max_tree_depth).unwrap_or(u32::MAX);
        let policy = config.quality.policy();

        let lookup = Lookup::new(Arc::clone(&store), extractor, matcher);
        let generator = Generator::new(oracle, limits);
        let pipeline = Pipeline::new(
            Arc::clone(&store),
            lookup.clone(),
            generator.clone(),
            sink,
            config.search,
            config.pipeline,
        );
        let votes = VoteService::new(Arc::clone(&store), policy, config.quality.vote_retry_limit);
        let regeneration = RegenerationService::new(
            Arc::clone(&store),
            generator,
            policy,
            config.quality.regeneration_retry_limit,
        );
        let catalog = Catalog::new(Arc::clone(&store), extractor, max_depth);
        let seeder = Seeder::new(Arc::clone(&store), extractor);

        Ok(Self {
            config,
            store,
            pipeline,
            lookup,
            votes,
            regeneration,
            catalog,
            seeder,
        })
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RoadmapStore> {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    #[inline]
    #[must_use]
    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    #[inline]
    #[must_use]
    pub fn votes(&self) -> &VoteService {
        &self.votes
    }

    #[inline]
    #[must_use]
    pub fn regeneration(&self) -> &RegenerationService {
        &self.regeneration
    }

    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    #[must_use]
    pub fn seeder(&self) -> &Seeder {
        &self.seeder
    }

    // ---------------------------------------------------------------------
    // Shortcuts
    // ---------------------------------------------------------------------

    /// See [`Pipeline::generate`]
    ///
    /// # Errors
    /// As [`Pipeline::generate`]
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerationOutcome, GenerationError> {
        self.pipeline.generate(request).await
    }

    /// See [`VoteService::cast`]
    ///
    /// # Errors
    /// As [`VoteService::cast`]
    pub async fn vote(&self, id: RoadmapId, voter: UserId, vote: Vote) -> Result<VoteTally, VoteError> {
        self.votes.cast(id, voter, vote).await
    }

    /// See [`RegenerationService::regenerate`]
    ///
    /// # Errors
    /// As [`RegenerationService::regenerate`]
    pub async fn regenerate(&self, id: RoadmapId, actor: &Actor) -> Result<RegenerationReport, RegenerationError> {
        self.regeneration.regenerate(id, actor).await
    }
}
