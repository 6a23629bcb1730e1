//! Deduplicating generation pipeline
//!
//! A request is answered from the cheapest source that fits:
//!
//! 1. exact title match, returned as stored
//! 2. best fuzzy match, if it is similar enough and not flagged for regeneration
//! 3. a roadmap created moments ago for the same prompt fingerprint
//! 4. the result of an identical generation already in flight
//! 5. a fresh oracle generation, committed as one transaction
//!
//! Fresh generations run in a detached task so a caller that goes away does not
//! abort the work other callers may be waiting on.

use crate::config::{PipelineConfig, SearchConfig};
use crate::error::GenerationError;
use crate::generator::Generator;
use crate::lookup::Lookup;
use crate::persist::{plan_tree, stage_new_roadmap, Attribution};
use crate::progress::{Progress, ProgressSink, ProgressStep, SubscriberId};
use crate::single_flight::{Flight, SingleFlight};
use moka::future::Cache;
use roadmap_model::{Node, Resource, Roadmap, RoadmapId, UserId};
use roadmap_search::Fingerprint;
use roadmap_store::RoadmapStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

/// A roadmap request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub requester: Option<UserId>,
    /// Generated content starts unapproved and is owned by the requester
    pub community: bool,
    pub subscriber: Option<SubscriberId>,
}

impl GenerateRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            requester: None,
            community: false,
            subscriber: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn by(mut self, requester: UserId) -> Self {
        self.requester = Some(requester);
        self
    }

    #[inline]
    #[must_use]
    pub fn community(mut self, community: bool) -> Self {
        self.community = community;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_subscriber(mut self, subscriber: SubscriberId) -> Self {
        self.subscriber = Some(subscriber);
        self
    }
}

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeSource {
    ExactMatch,
    FuzzyMatch { similarity: f64 },
    /// Created shortly before for the same prompt fingerprint
    Redirected,
    /// Shared result of an identical in-flight generation
    Coalesced,
    Generated,
}

impl OutcomeSource {
    /// Whether the oracle was called for this answer
    #[inline]
    #[must_use]
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated | Self::Coalesced)
    }
}

/// Roadmap returned by the pipeline with its tree payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutcome {
    pub roadmap: Roadmap,
    /// Flat nodes ordered by `(depth, position)`
    pub nodes: Vec<Node>,
    pub resources: Vec<Resource>,
    pub source: OutcomeSource,
}

impl GenerationOutcome {
    #[inline]
    #[must_use]
    fn with_source(mut self, source: OutcomeSource) -> Self {
        self.source = source;
        self
    }
}

type FlightResult = Result<GenerationOutcome, GenerationError>;

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Cache-first roadmap generation
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn RoadmapStore>,
    lookup: Lookup,
    generator: Generator,
    sink: Arc<dyn ProgressSink>,
    flights: SingleFlight<Fingerprint, FlightResult>,
    redirects: Cache<Fingerprint, RoadmapId>,
    search: SearchConfig,
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn RoadmapStore>,
        lookup: Lookup,
        generator: Generator,
        sink: Arc<dyn ProgressSink>,
        search: SearchConfig,
        config: PipelineConfig,
    ) -> Self {
        let redirects = Cache::builder()
            .max_capacity(config.redirect_capacity)
            .time_to_live(config.redirect_ttl())
            .build();
        Self {
            inner: Arc::new(Inner {
                store,
                lookup,
                generator,
                sink,
                flights: SingleFlight::new(),
                redirects,
                search,
                config,
            }),
        }
    }

    /// Generations currently in flight
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.flights.in_flight()
    }

    /// Answer `request` from the cache or by generating
    ///
    /// Every failure is reported to the request's progress subscriber before it
    /// is returned.
    ///
    /// # Errors
    /// [`GenerationError`] describing the failed stage
    #[instrument(skip_all, fields(prompt = %request.prompt))]
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerationOutcome, GenerationError> {
        let progress = Progress::new(Arc::clone(&self.inner.sink), request.subscriber.clone());
        match self.resolve(&request, &progress).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(error = %e, "roadmap request failed");
                progress.fail(&e);
                Err(e)
            }
        }
    }

    async fn resolve(&self, request: &GenerateRequest, progress: &Progress) -> FlightResult {
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        let inner = &self.inner;

        progress.step(ProgressStep::Analyzing, 5);
        progress.step_with(ProgressStep::Searching, 10, "Searching for existing roadmap");
        if let Some(roadmap) = inner.lookup.exact(prompt).await? {
            debug!(roadmap = %roadmap.id, "exact match");
            metrics::counter!("roadmap_cache_hits_total", "kind" => "exact").increment(1);
            progress.step_with(ProgressStep::Complete, 100, "Found existing roadmap");
            return self.load(roadmap, OutcomeSource::ExactMatch).await;
        }

        progress.step_with(ProgressStep::Searching, 15, "Checking similar roadmaps");
        let best = inner
            .lookup
            .similar(prompt, inner.search.fuzzy_threshold)
            .await?
            .into_iter()
            .next();
        if let Some(best) = best {
            if best.similarity >= inner.search.serve_threshold && !best.roadmap.needs_regeneration {
                debug!(roadmap = %best.roadmap.id, similarity = best.similarity, "fuzzy match");
                metrics::counter!("roadmap_cache_hits_total", "kind" => "fuzzy").increment(1);
                let roadmap = inner.store.increment_views(best.roadmap.id).await?.unwrap_or(best.roadmap);
                progress.step_with(ProgressStep::Complete, 100, "Found similar roadmap");
                return self
                    .load(roadmap, OutcomeSource::FuzzyMatch { similarity: best.similarity })
                    .await;
            }
            debug!(similarity = best.similarity, degraded = best.roadmap.needs_regeneration, "fuzzy match not served");
        }
        metrics::counter!("roadmap_cache_misses_total").increment(1);

        let fingerprint = Fingerprint::of_prompt(prompt);
        if let Some(outcome) = self.redirected(fingerprint).await? {
            progress.step_with(ProgressStep::Complete, 100, "Found recently generated roadmap");
            return Ok(outcome);
        }

        match inner.flights.join(fingerprint) {
            Flight::Leader(guard) => {
                debug!(fingerprint = %fingerprint.short(), "leading generation");
                let this = self.clone();
                let request = request.clone();
                let progress = progress.clone();
                let task = tokio::spawn(async move {
                    // A flight may have finished between the redirect check and join
                    let result = match this.redirected(fingerprint).await {
                        Ok(Some(outcome)) => Ok(outcome),
                        Ok(None) => this.generate_fresh(&request, &progress).await,
                        Err(e) => Err(e),
                    };
                    if let Ok(outcome) = &result {
                        this.inner.redirects.insert(fingerprint, outcome.roadmap.id).await;
                    }
                    guard.complete(result.clone());
                    result
                });
                task.await.map_err(|e| {
                    error!(error = %e, "generation task failed");
                    GenerationError::Abandoned
                })?
            }
            Flight::Follower(mut rx) => {
                debug!(fingerprint = %fingerprint.short(), "joining in-flight generation");
                progress.step_with(ProgressStep::Generating, 20, "Waiting for identical request in progress");
                let timeout = inner.config.follower_timeout();
                let outcome = match tokio::time::timeout(timeout, rx.recv()).await {
                    Err(_) => Err(GenerationError::FollowerTimeout {
                        secs: timeout.as_secs(),
                    }),
                    Ok(Err(_)) => Err(GenerationError::Abandoned),
                    Ok(Ok(result)) => result.map(|o| o.with_source(OutcomeSource::Coalesced)),
                }?;
                progress.step_with(ProgressStep::Complete, 100, "Roadmap ready");
                Ok(outcome)
            }
        }
    }

    async fn redirected(&self, fingerprint: Fingerprint) -> Result<Option<GenerationOutcome>, GenerationError> {
        let Some(id) = self.inner.redirects.get(&fingerprint).await else {
            return Ok(None);
        };
        match self.inner.store.find_roadmap(id).await? {
            Some(roadmap) => {
                debug!(roadmap = %id, "redirected to recent generation");
                metrics::counter!("roadmap_cache_hits_total", "kind" => "redirect").increment(1);
                Ok(Some(self.load(roadmap, OutcomeSource::Redirected).await?))
            }
            None => {
                self.inner.redirects.invalidate(&fingerprint).await;
                Ok(None)
            }
        }
    }

    async fn load(&self, roadmap: Roadmap, source: OutcomeSource) -> FlightResult {
        let store = &self.inner.store;
        let (nodes, resources) =
            futures::try_join!(store.find_nodes(roadmap.id), store.find_resources(roadmap.id))?;
        Ok(GenerationOutcome {
            roadmap,
            nodes,
            resources,
            source,
        })
    }

    async fn generate_fresh(&self, request: &GenerateRequest, progress: &Progress) -> FlightResult {
        let inner = &self.inner;
        let prompt = request.prompt.trim();

        progress.step_with(ProgressStep::Generating, 20, "Generating new roadmap");
        progress.step_with(ProgressStep::Researching, 25, "Researching content");
        let generated = inner.generator.generate(prompt).await?;
        metrics::counter!("roadmap_generations_total").increment(1);

        progress.step_with(ProgressStep::Structuring, 35, "Structuring roadmap");
        let keywords = inner
            .lookup
            .keywords(&format!("{} {}", generated.title, generated.description));
        let owner = if request.community { request.requester } else { None };
        let mut shell = Roadmap::new(generated.title.as_str(), generated.description.as_str())
            .map_err(|e| GenerationError::validation(e.to_string()))?
            .with_category(generated.category)
            .with_difficulty(generated.difficulty)
            .with_search_keywords(keywords)
            .contributed_by(owner, request.community);
        shell.stamp(request.requester);

        progress.step_with(ProgressStep::Generating, 60, "Generating details");
        let attribution = Attribution {
            requester: request.requester,
            community: request.community,
        };
        let plan = plan_tree(shell.id, &generated.nodes, attribution);
        let mut nodes: Vec<Node> = plan.nodes().cloned().collect();
        let resources: Vec<Resource> = plan.resources().cloned().collect();

        progress.step_with(ProgressStep::Finalizing, 95, "Finalizing roadmap");
        let mut roadmap = shell.clone();
        let receipts = inner
            .store
            .commit(stage_new_roadmap(shell, plan))
            .await
            .map_err(|e| {
                warn!(roadmap = %roadmap.id, error = %e, "roadmap commit failed, nothing persisted");
                metrics::counter!("roadmap_rollbacks_total").increment(1);
                e
            })?;
        roadmap.revision = receipts.first().and_then(|r| r.revision).unwrap_or(1);

        info!(
            roadmap = %roadmap.id,
            title = %roadmap.title,
            nodes = generated.node_count(),
            "roadmap generated"
        );
        progress.step_with(ProgressStep::Complete, 100, "Roadmap ready");

        nodes.sort_by_key(|n| (n.depth, n.position));
        Ok(GenerationOutcome {
            roadmap,
            nodes,
            resources,
            source: OutcomeSource::Generated,
        })
    }
}
