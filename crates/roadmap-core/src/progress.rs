//! Generation progress events
//!
//! Progress is fire-and-forget: the pipeline never waits on, or fails because of,
//! a subscriber. [`ProgressHub`] fans events out to in-process subscribers over
//! unbounded channels; closed subscribers are pruned on the next publish.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Identifier of a progress subscriber (socket id, session id, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(pub String);

impl SubscriberId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStep {
    Analyzing,
    Searching,
    Generating,
    Researching,
    Structuring,
    Finalizing,
    Complete,
    Error,
}

/// One progress update: `{step, progress, error?, message?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: ProgressStep,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressEvent {
    #[inline]
    #[must_use]
    pub fn new(step: ProgressStep, progress: u8) -> Self {
        Self {
            step,
            progress,
            error: None,
            message: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Terminal error event (progress 0)
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            step: ProgressStep::Error,
            progress: 0,
            error: Some(error.into()),
            message: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.step, ProgressStep::Complete | ProgressStep::Error)
    }
}

/// Publish target keyed by subscriber
pub trait ProgressSink: Send + Sync {
    fn publish(&self, subscriber: &SubscriberId, event: ProgressEvent);
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _subscriber: &SubscriberId, _event: ProgressEvent) {}
}

/// In-process fan-out of progress events
#[derive(Debug, Default)]
pub struct ProgressHub {
    subscribers: DashMap<SubscriberId, mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressHub {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id`, replacing any previous registration
    pub fn subscribe(&self, id: SubscriberId) -> mpsc::UnboundedReceiver<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, tx);
        rx
    }

    pub fn unsubscribe(&self, id: &SubscriberId) {
        self.subscribers.remove(id);
    }

    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl ProgressSink for ProgressHub {
    fn publish(&self, subscriber: &SubscriberId, event: ProgressEvent) {
        let closed = match self.subscribers.get(subscriber) {
            Some(tx) => tx.send(event).is_err(),
            None => false,
        };
        if closed {
            tracing::debug!(%subscriber, "pruning closed progress subscriber");
            self.subscribers.remove(subscriber);
        }
    }
}

/// Per-request emitter; a no-op when the request has no subscriber
#[derive(Clone)]
pub(crate) struct Progress {
    sink: Arc<dyn ProgressSink>,
    subscriber: Option<SubscriberId>,
}

impl Progress {
    pub(crate) fn new(sink: Arc<dyn ProgressSink>, subscriber: Option<SubscriberId>) -> Self {
        Self { sink, subscriber }
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(subscriber) = &self.subscriber {
            self.sink.publish(subscriber, event);
        }
    }

    pub(crate) fn step(&self, step: ProgressStep, progress: u8) {
        self.emit(ProgressEvent::new(step, progress));
    }

    pub(crate) fn step_with(&self, step: ProgressStep, progress: u8, message: &str) {
        self.emit(ProgressEvent::new(step, progress).with_message(message));
    }

    pub(crate) fn fail(&self, error: &dyn fmt::Display) {
        self.emit(ProgressEvent::failed(error.to_string()));
    }
}
