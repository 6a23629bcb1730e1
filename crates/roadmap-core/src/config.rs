//! Engine configuration
//!
//! Loaded from TOML; every section and field is optional and falls back to its
//! default. Oracle settings can be overridden from the environment
//! (`OPENAI_API_KEY`, `ROADMAP_ORACLE_MODEL`, `ROADMAP_ORACLE_BASE_URL`).

use crate::error::ConfigError;
use roadmap_oracle::OpenAiConfig;
use roadmap_quality::QualityPolicy;
use roadmap_search::{SimilarityWeights, MAX_KEYWORDS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "ROADMAP_ORACLE_MODEL";
pub const ENV_BASE_URL: &str = "ROADMAP_ORACLE_BASE_URL";

/// Oracle client settings
pub type OracleConfig = OpenAiConfig;

/// Lookup thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidates below this similarity are ignored by the pipeline
    pub fuzzy_threshold: f64,
    /// Best candidate must reach this to be served instead of generating
    pub serve_threshold: f64,
    /// Default threshold for explicit similarity searches
    pub search_threshold: f64,
    pub max_keywords: usize,
    pub weights: SimilarityWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.7,
            serve_threshold: 0.8,
            search_threshold: 0.6,
            max_keywords: MAX_KEYWORDS,
            weights: SimilarityWeights::default(),
        }
    }
}

/// Vote and regeneration settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub downvote_threshold: usize,
    /// Compare-and-swap attempts before a vote gives up
    pub vote_retry_limit: u32,
    /// Commit attempts before a regeneration gives up on a moving roadmap
    pub regeneration_retry_limit: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            downvote_threshold: roadmap_quality::DEFAULT_DOWNVOTE_THRESHOLD,
            vote_retry_limit: 8,
            regeneration_retry_limit: 3,
        }
    }
}

impl QualityConfig {
    #[inline]
    #[must_use]
    pub fn policy(&self) -> QualityPolicy {
        QualityPolicy::with_threshold(self.downvote_threshold)
    }
}

/// Generation pipeline settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_tree_depth: usize,
    pub max_tree_nodes: usize,
    /// How long a follower waits for an identical in-flight generation
    pub follower_timeout_secs: u64,
    /// Lifetime of fingerprint -> new roadmap redirects
    pub redirect_ttl_secs: u64,
    pub redirect_capacity: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_tree_depth: 8,
            max_tree_nodes: 400,
            follower_timeout_secs: 120,
            redirect_ttl_secs: 60,
            redirect_capacity: 10_000,
        }
    }
}

impl PipelineConfig {
    #[inline]
    #[must_use]
    pub fn follower_timeout(&self) -> Duration {
        Duration::from_secs(self.follower_timeout_secs)
    }

    #[inline]
    #[must_use]
    pub fn redirect_ttl(&self) -> Duration {
        Duration::from_secs(self.redirect_ttl_secs)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub quality: QualityConfig,
    pub pipeline: PipelineConfig,
    pub oracle: OracleConfig,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed TOML, [`ConfigError::Invalid`] when
    /// values are out of range
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if unreadable, otherwise as [`EngineConfig::from_toml`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    /// Apply oracle overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply oracle overrides from an arbitrary variable source
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.oracle.api_key = Some(key);
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            self.oracle.model = model;
        }
        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.oracle.base_url = url;
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_oracle(mut self, oracle: OracleConfig) -> Self {
        self.oracle = oracle;
        self
    }

    /// With downvote threshold
    #[inline]
    #[must_use]
    pub fn with_downvote_threshold(mut self, threshold: usize) -> Self {
        self.quality.downvote_threshold = threshold;
        self
    }

    /// With follower timeout
    #[inline]
    #[must_use]
    pub fn with_follower_timeout(mut self, timeout: Duration) -> Self {
        self.pipeline.follower_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = 0.0..=1.0;
        for (name, value) in [
            ("search.fuzzy_threshold", self.search.fuzzy_threshold),
            ("search.serve_threshold", self.search.serve_threshold),
            ("search.search_threshold", self.search.search_threshold),
        ] {
            if !unit.contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if self.quality.downvote_threshold == 0 {
            return Err(ConfigError::Invalid("quality.downvote_threshold must be positive".into()));
        }
        if self.quality.vote_retry_limit == 0 || self.quality.regeneration_retry_limit == 0 {
            return Err(ConfigError::Invalid("quality retry limits must be positive".into()));
        }
        if self.pipeline.max_tree_depth == 0 || self.pipeline.max_tree_nodes == 0 {
            return Err(ConfigError::Invalid("pipeline tree bounds must be positive".into()));
        }
        Ok(())
    }
}
