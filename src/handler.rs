//! # Task Handler Contract
//!
//! Task handlers are the sinks of the node graph: once every node has run,
//! each registered handler reads its declared input paths from the finished
//! context and writes a transformed payload for the outgoing message,
//! typically by assigning one named output column per row.
//!
//! ## Output column discipline
//!
//! Multiple handlers may be registered on one engine; all of them run, in
//! registration order, against the same finished context, each receiving the
//! payload produced by the previous one. To keep the merge well-defined,
//! every handler declares the columns it writes via
//! [`TaskHandler::output_columns`], and the builder rejects two handlers
//! claiming the same column at definition time rather than silently
//! overwriting at run time.

use crate::context::ExecutionContext;
use crate::path::NodePath;
use crate::table::{TableError, TablePayload};
use crate::task::Task;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for task handler failures.
///
/// A handler failure aborts only the current run; the engine wraps it into
/// [`crate::error::EngineRunError::Handler`].
#[derive(Error, Debug)]
pub enum HandlerExecutionError {
  /// A declared input path is absent from the finished context.
  ///
  /// Only reachable if graph validation was bypassed (e.g. a handler driven
  /// directly against a hand-built context).
  #[error("context entry '{path}' is missing")]
  MissingInput {
    /// The absent input path.
    path: NodePath,
  },
  /// A context entry does not have the per-row column shape the handler
  /// expects.
  #[error("context entry '{path}' is not a per-row column")]
  NotAColumn {
    /// The path with the unexpected shape.
    path: NodePath,
  },
  /// A context result's row count disagrees with the message's row count.
  #[error("context entry '{path}' has {actual} rows, message has {expected}")]
  RowCountMismatch {
    /// The misaligned input path.
    path: NodePath,
    /// The message's row count.
    expected: usize,
    /// The context entry's row count.
    actual: usize,
  },
  /// The number of registered input paths does not match the number of
  /// declared output columns.
  #[error("handler declares {outputs} output columns but was registered with {inputs} inputs")]
  OutputArity {
    /// Registered input paths.
    inputs: usize,
    /// Declared output columns.
    outputs: usize,
  },
  /// Writing the output columns into the payload failed.
  #[error(transparent)]
  Table(#[from] TableError),
}

/// Consumes selected context entries and produces the outgoing payload.
///
/// Handlers are pure with respect to the message: they receive the payload
/// by value and return a new one, so a failing handler leaves no partial
/// mutation behind.
#[async_trait]
pub trait TaskHandler: Send + Sync {
  /// The output columns this handler writes.
  ///
  /// Declared at construction so the builder can detect collisions between
  /// handlers eagerly, before any message is processed.
  fn output_columns(&self) -> Vec<String>;

  /// Produces the outgoing payload from the finished context.
  ///
  /// # Arguments
  ///
  /// * `inputs` - The paths this handler was registered with, in
  ///   registration order
  /// * `context` - The finished context, with every node's result committed
  /// * `task` - The task attached to the message
  /// * `payload` - The payload to transform; for the first handler this is
  ///   the incoming message's payload, for later handlers the previous
  ///   handler's output
  ///
  /// # Errors
  ///
  /// Returns [`HandlerExecutionError`] if an input is missing or misshapen
  /// or if row alignment with the message is violated.
  async fn handle(
    &self,
    inputs: &[NodePath],
    context: &ExecutionContext,
    task: &Task,
    payload: TablePayload,
  ) -> Result<TablePayload, HandlerExecutionError>;
}
