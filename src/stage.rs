//! # Stage Adapter
//!
//! A thin boundary between the surrounding linear pipeline and the engine.
//! The adapter is configured with one task type; for every incoming message
//! whose attached task matches it, the engine runs exactly once and the
//! result is forwarded. Messages addressed to some other stage pass through
//! unmodified and untouched - no node or handler is invoked for them.
//!
//! The adapter never retries a failed run: an [`EngineRunError`] propagates
//! to the caller, which owns the drop/forward/halt policy.

use crate::engine::LlmEngine;
use crate::error::EngineRunError;
use crate::message::{ControlMessage, EngineMessage};
use async_stream::stream;
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

/// Runs an [`LlmEngine`] over the messages of one pipeline stage.
///
/// The engine is shared via `Arc`, so any number of stages (or any other
/// caller) can drive the same immutable graph concurrently.
pub struct LlmEngineStage {
  engine: Arc<LlmEngine>,
  task_type: String,
}

impl LlmEngineStage {
  /// Creates a stage adapter for messages of the given task type.
  #[must_use]
  pub fn new(engine: Arc<LlmEngine>, task_type: impl Into<String>) -> Self {
    Self {
      engine,
      task_type: task_type.into(),
    }
  }

  /// Returns the task type this stage responds to.
  #[must_use]
  pub fn task_type(&self) -> &str {
    &self.task_type
  }

  /// Processes one message.
  ///
  /// A matching task type means exactly one engine run; anything else is
  /// returned as-is.
  ///
  /// # Errors
  ///
  /// Propagates the [`EngineRunError`] of a failed run.
  pub async fn process(&self, message: ControlMessage) -> Result<ControlMessage, EngineRunError> {
    if message.task().task_type() != self.task_type {
      debug!(
        expected = %self.task_type,
        actual = message.task().task_type(),
        "task type mismatch, passing message through"
      );
      return Ok(message);
    }
    match self.engine.run(&message).await {
      Ok(outgoing) => Ok(outgoing),
      Err(error) => {
        warn!(%error, "engine run failed");
        Err(error)
      }
    }
  }

  /// Processes a batch of messages in order.
  ///
  /// # Errors
  ///
  /// The first failed run aborts the batch; messages after it are not
  /// processed.
  pub async fn process_batch(
    &self,
    messages: Vec<ControlMessage>,
  ) -> Result<Vec<ControlMessage>, EngineRunError> {
    let mut outgoing = Vec::with_capacity(messages.len());
    for message in messages {
      outgoing.push(self.process(message).await?);
    }
    Ok(outgoing)
  }

  /// Lifts the stage over a stream of messages.
  ///
  /// Each item of the returned stream is the per-message outcome; the
  /// stream itself keeps going after a failed run, leaving the policy to
  /// the consumer.
  pub fn transform<'a, S>(
    &'a self,
    input: S,
  ) -> impl Stream<Item = Result<ControlMessage, EngineRunError>> + 'a
  where
    S: Stream<Item = ControlMessage> + 'a,
  {
    stream! {
      let mut input = Box::pin(input);
      while let Some(message) = input.next().await {
        yield self.process(message).await;
      }
    }
  }
}
