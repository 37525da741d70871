//! # Engine Error Taxonomy
//!
//! Two failure domains exist, and they never mix:
//!
//! - [`DefinitionError`] is raised while the graph registry is being built
//!   (duplicate name, unresolved dependency, cycle, colliding handler
//!   outputs). It is fatal to constructing the engine and can never surface
//!   mid-run, because the registry is validated once and immutable after.
//! - [`EngineRunError`] is raised during a single run and is scoped to that
//!   run's message only. It wraps the failing component's own error
//!   ([`NodeExecutionError`] or [`HandlerExecutionError`]) and names the
//!   component, so callers can log or route the failure without losing the
//!   cause.
//!
//! The engine never swallows a node or handler failure, and a failed run
//! never partially applies results: the caller decides whether to drop the
//! message, forward it unmodified, or halt.

use crate::handler::HandlerExecutionError;
use crate::node::NodeExecutionError;
use crate::path::{NodePath, PathParseError};
use thiserror::Error;

/// Error type for graph registry construction.
///
/// All variants are detected eagerly, before any message is processed.
#[derive(Error, Debug)]
pub enum DefinitionError {
  /// A node or handler referenced an ill-formed path, or a node was
  /// registered under an ill-formed name.
  #[error(transparent)]
  InvalidPath(#[from] PathParseError),
  /// Two nodes were registered under the same name.
  #[error("duplicate node name '{name}'")]
  DuplicateNodeName {
    /// The repeated name.
    name: String,
  },
  /// A declared dependency does not resolve to any registered node's
  /// output path.
  #[error("{referrer} depends on '{path}', which no registered node provides")]
  UnresolvedDependency {
    /// The component declaring the dependency (a node name or a task
    /// handler position).
    referrer: String,
    /// The unresolved path.
    path: NodePath,
  },
  /// The declared dependencies contain a cycle.
  #[error("dependency cycle among nodes: {}", unordered.join(", "))]
  Cycle {
    /// The nodes that could not be ordered.
    unordered: Vec<String>,
  },
  /// Two task handlers declared the same output column.
  #[error("output column '{column}' is claimed by more than one task handler")]
  HandlerOutputCollision {
    /// The contested column name.
    column: String,
  },
}

/// Error type for a single engine run.
///
/// Exactly one of these is produced per failed run, naming the failing
/// component and carrying the underlying cause as its source.
#[derive(Error, Debug)]
pub enum EngineRunError {
  /// A node failed while executing.
  #[error("node '{name}' failed")]
  Node {
    /// The registered name of the failing node.
    name: String,
    /// The node's own error.
    #[source]
    source: NodeExecutionError,
  },
  /// A task handler failed while producing the outgoing payload.
  #[error("task handler #{index} failed")]
  Handler {
    /// The handler's registration position (zero-based).
    index: usize,
    /// The handler's own error.
    #[source]
    source: HandlerExecutionError,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cycle_message_lists_nodes() {
    let err = DefinitionError::Cycle {
      unordered: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(err.to_string(), "dependency cycle among nodes: a, b");
  }

  #[test]
  fn test_run_error_carries_source() {
    use std::error::Error;

    let err = EngineRunError::Node {
      name: "extracter".to_string(),
      source: NodeExecutionError::MissingColumn {
        column: "log".to_string(),
      },
    };
    assert_eq!(err.to_string(), "node 'extracter' failed");
    assert!(err.source().unwrap().to_string().contains("'log'"));
  }
}
