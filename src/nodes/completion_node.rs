//! # Completion Node
//!
//! A context-sourced node that sends one prompt per message row to an
//! external completion service and stores the responses as its context
//! entry. This is the model-invocation variant of the node contract: the
//! graph stays agnostic of what the backend actually is, and the engine's
//! wave scheduling lets the backend round-trip overlap with independent
//! nodes and with other in-flight runs.
//!
//! The backend seam is [`CompletionBackend`], an async trait taking the full
//! per-row prompt batch in one call; batching across messages, retries and
//! rate limiting belong behind that seam, not in the node.

use crate::context::{ExecutionContext, NodeResult};
use crate::node::{LlmNode, NodeExecutionError};
use crate::path::NodePath;
use crate::task::Task;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Error type for completion backend calls.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct CompletionError {
  message: String,
  #[source]
  source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CompletionError {
  /// Creates an error from a message.
  #[must_use]
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      source: None,
    }
  }

  /// Creates an error wrapping an underlying cause.
  #[must_use]
  pub fn with_source(
    message: impl Into<String>,
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self {
      message: message.into(),
      source: Some(Box::new(source)),
    }
  }
}

/// The external completion service seam.
///
/// `complete` receives one prompt per message row and must return exactly
/// one response per prompt, in order.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
  /// Completes a batch of prompts.
  ///
  /// # Errors
  ///
  /// Returns [`CompletionError`] if the service call fails.
  async fn complete(&self, prompts: &[String]) -> Result<Vec<String>, CompletionError>;
}

/// Sends each row of an upstream column to a completion backend.
///
/// Reads the upstream path it was constructed with (which must also be
/// declared as the node's dependency at registration), stringifies each cell
/// into a prompt (string cells verbatim, other JSON values in their JSON
/// rendering), and stores the backend's responses as a per-row column.
pub struct CompletionNode<B> {
  backend: B,
  input: NodePath,
}

impl<B: CompletionBackend> CompletionNode<B> {
  /// Creates a completion node reading prompts from `input`.
  ///
  /// # Errors
  ///
  /// Returns [`crate::path::PathParseError`] if `input` is not a valid
  /// slash-prefixed path.
  pub fn new(backend: B, input: &str) -> Result<Self, crate::path::PathParseError> {
    Ok(Self {
      backend,
      input: NodePath::parse(input)?,
    })
  }
}

#[async_trait]
impl<B: CompletionBackend> LlmNode for CompletionNode<B> {
  async fn execute(
    &self,
    context: &ExecutionContext,
    _task: &Task,
  ) -> Result<NodeResult, NodeExecutionError> {
    let upstream = context
      .get(&self.input)
      .ok_or_else(|| NodeExecutionError::MissingUpstream {
        path: self.input.clone(),
      })?;
    let cells = upstream
      .as_column()
      .ok_or_else(|| NodeExecutionError::UpstreamShape {
        path: self.input.clone(),
      })?;

    let prompts: Vec<String> = cells
      .iter()
      .map(|cell| match cell {
        Value::String(text) => text.clone(),
        other => other.to_string(),
      })
      .collect();

    let responses = self
      .backend
      .complete(&prompts)
      .await
      .map_err(|source| NodeExecutionError::External {
        source: Box::new(source),
      })?;
    if responses.len() != prompts.len() {
      return Err(NodeExecutionError::ExternalBatchSize {
        expected: prompts.len(),
        actual: responses.len(),
      });
    }

    Ok(NodeResult::Column(
      responses.into_iter().map(Value::String).collect(),
    ))
  }
}
