//! Oracle interface

use crate::error::OracleError;
use async_trait::async_trait;

/// External text-generation step
///
/// Given an instruction, returns raw text that is expected to contain a JSON
/// roadmap. Implementations must be shareable across tasks.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Short identifier for logs (model name, "scripted", ...)
    fn id(&self) -> &str;

    async fn complete(&self, instruction: &str) -> Result<String, OracleError>;
}
