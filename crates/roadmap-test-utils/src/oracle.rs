//! Scripted oracle for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use roadmap_oracle::{Oracle, OracleError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Oracle answering from a script
///
/// Queued answers are used first, in order; afterwards every call gets the
/// default answer.
pub struct ScriptedOracle {
    id: String,
    queue: Mutex<VecDeque<Result<String, OracleError>>>,
    default: Result<String, OracleError>,
    delay: Option<Duration>,
    call_count: AtomicU32,
    instructions: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    /// Oracle that always answers `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self::from_result(Ok(response.into()))
    }

    /// Oracle that always fails with `error`
    pub fn failing(error: OracleError) -> Self {
        Self::from_result(Err(error))
    }

    fn from_result(default: Result<String, OracleError>) -> Self {
        Self {
            id: "scripted".to_string(),
            queue: Mutex::new(VecDeque::new()),
            default,
            delay: None,
            call_count: AtomicU32::new(0),
            instructions: Mutex::new(Vec::new()),
        }
    }

    /// Queue a one-off answer
    pub fn then(self, response: Result<String, OracleError>) -> Self {
        self.queue.lock().push_back(response);
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls so far
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Instructions received, oldest first
    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, instruction: &str) -> Result<String, OracleError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.instructions.lock().push(instruction.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.queue.lock().pop_front();
        queued.unwrap_or_else(|| self.default.clone())
    }
}
