//! Oracle round trip: instruction, completion, validation

use crate::error::GenerationError;
use crate::normalize::{parse_generated, GeneratedRoadmap, TreeLimits};
use roadmap_oracle::{build_instruction, strip_code_fences, Oracle};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Produces validated roadmap trees from free-text requests
#[derive(Clone)]
pub struct Generator {
    oracle: Arc<dyn Oracle>,
    limits: TreeLimits,
}

impl Generator {
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, limits: TreeLimits) -> Self {
        Self { oracle, limits }
    }

    /// Ask the oracle for a roadmap answering `request`
    ///
    /// # Errors
    /// [`GenerationError::Upstream`] if the oracle fails,
    /// [`GenerationError::Validation`] if its answer is unusable
    #[instrument(skip(self))]
    pub async fn generate(&self, request: &str) -> Result<GeneratedRoadmap, GenerationError> {
        let instruction = build_instruction(request);
        let raw = self.oracle.complete(&instruction).await?;
        debug!(bytes = raw.len(), "oracle answered");
        let roadmap = parse_generated(strip_code_fences(&raw), self.limits)?;
        debug!(title = %roadmap.title, nodes = roadmap.node_count(), "oracle answer validated");
        Ok(roadmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use roadmap_oracle::OracleError;

    mock! {
        pub Oracle {}

        #[async_trait]
        impl Oracle for Oracle {
            fn id(&self) -> &str;
            async fn complete(&self, instruction: &str) -> Result<String, OracleError>;
        }
    }

    fn oracle_returning(text: &'static str) -> MockOracle {
        let mut oracle = MockOracle::new();
        oracle
            .expect_complete()
            .withf(|instruction: &str| instruction.contains("\"Kotlin for Android\""))
            .times(1)
            .returning(move |_| Ok(text.to_string()));
        oracle
    }

    #[tokio::test]
    async fn fenced_answer_is_parsed() {
        let oracle = oracle_returning(
            "```json\n{\"title\":\"Kotlin\",\"category\":\"mobile\",\"nodes\":[{\"title\":\"Syntax\"}]}\n```",
        );
        let generator = Generator::new(Arc::new(oracle), TreeLimits::default());
        let roadmap = generator.generate("Kotlin for Android").await.unwrap();
        assert_eq!(roadmap.title, "Kotlin");
        assert_eq!(roadmap.node_count(), 1);
    }

    #[tokio::test]
    async fn oracle_failure_is_upstream() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_complete()
            .returning(|_| Err(OracleError::Timeout { secs: 120 }));
        let generator = Generator::new(Arc::new(oracle), TreeLimits::default());

        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::Upstream(OracleError::Timeout { .. })));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn answer_without_nodes_is_invalid() {
        let oracle = oracle_returning(r#"{"title":"Kotlin","category":"mobile"}"#);
        let generator = Generator::new(Arc::new(oracle), TreeLimits::default());
        let err = generator.generate("Kotlin for Android").await.unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
    }
}
