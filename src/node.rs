//! # Node Contract
//!
//! This module defines the [`LlmNode`] trait, the uniform contract every unit
//! of computation in the engine's graph satisfies.
//!
//! ## Two input modes
//!
//! - **Message-sourced** nodes read named columns directly from the incoming
//!   message's tabular payload (via [`ExecutionContext::payload`]), governed
//!   by `input_keys` in the task payload. The field-extraction node in
//!   [`crate::nodes::extracter_node`] is the canonical example.
//! - **Context-sourced** nodes read one or more upstream context paths and
//!   produce a derived result. This is the extension point for
//!   model-invocation and transformation nodes; see
//!   [`crate::nodes::completion_node`].
//!
//! ## Execution model
//!
//! `execute` is async so a node may suspend on an external call (e.g. a
//! model-serving endpoint) without blocking unrelated runs. A node's only
//! effect is its returned [`NodeResult`], which the engine commits under the
//! node's registered path; nodes never mutate entries they did not produce
//! and never touch the message.
//!
//! [`ExecutionContext::payload`]: crate::context::ExecutionContext::payload

use crate::context::{ExecutionContext, NodeResult};
use crate::path::NodePath;
use crate::task::Task;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for node execution failures.
///
/// A node failure aborts only the current run; the engine wraps it into
/// [`crate::error::EngineRunError::Node`] together with the failing node's
/// registered name.
#[derive(Error, Debug)]
pub enum NodeExecutionError {
  /// A required task payload entry is absent or has the wrong shape.
  #[error("task payload entry '{key}' is missing or not a list of strings")]
  InvalidTaskPayload {
    /// The payload key the node needed.
    key: String,
  },
  /// A required input column is absent from the message payload.
  #[error("column '{column}' not found in message payload")]
  MissingColumn {
    /// The missing column name.
    column: String,
  },
  /// A declared upstream context entry has not been written.
  ///
  /// Unreachable through a validated engine; kept for nodes driven against
  /// a hand-built context.
  #[error("upstream context entry '{path}' is missing")]
  MissingUpstream {
    /// The path the node depends on.
    path: NodePath,
  },
  /// An upstream context entry does not have the shape the node expects.
  #[error("upstream context entry '{path}' is not a per-row column")]
  UpstreamShape {
    /// The path with the unexpected shape.
    path: NodePath,
  },
  /// An external service call made by the node failed.
  #[error("external call failed: {source}")]
  External {
    /// The underlying service error.
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
  /// An external service returned a result that is not aligned with the
  /// request (e.g. a wrong-length response batch).
  #[error("external call returned {actual} results for {expected} inputs")]
  ExternalBatchSize {
    /// Inputs sent.
    expected: usize,
    /// Results received.
    actual: usize,
  },
}

/// The uniform contract for one unit of computation over a context.
///
/// Implementations are registered on an engine under a name; the engine
/// stores each node's result under the path `/name` and guarantees that
/// `execute` is only invoked after every declared dependency's entry is
/// fully written.
///
/// Nodes must be stateless with respect to runs: one node instance serves
/// arbitrarily many concurrent runs, each with its own context.
#[async_trait]
pub trait LlmNode: Send + Sync {
  /// Runs this node against the current run's context.
  ///
  /// # Arguments
  ///
  /// * `context` - Read view of the run's context: the incoming tabular
  ///   payload plus every upstream result written so far
  /// * `task` - The task attached to the message, carrying per-message
  ///   configuration such as `input_keys`
  ///
  /// # Returns
  ///
  /// The result to store under this node's registered path.
  ///
  /// # Errors
  ///
  /// Returns [`NodeExecutionError`] if the node cannot produce a result;
  /// this aborts the current run only.
  async fn execute(
    &self,
    context: &ExecutionContext,
    task: &Task,
  ) -> Result<NodeResult, NodeExecutionError>;
}
