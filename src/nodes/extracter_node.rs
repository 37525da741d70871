//! # Extracter Node
//!
//! A message-sourced leaf node that copies named columns from the incoming
//! message's tabular payload into its context entry, verbatim.
//!
//! The columns to extract are selected per message by the task payload:
//!
//! ```json
//! {"input_keys": ["log"]}
//! ```
//!
//! One key produces a plain per-row column; several keys produce a table of
//! columns keyed by name, so downstream nodes can address each input
//! individually.

use crate::context::{ExecutionContext, NodeResult};
use crate::node::{LlmNode, NodeExecutionError};
use crate::task::Task;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Task payload key naming the columns to extract.
pub const INPUT_KEYS: &str = "input_keys";

/// Copies message columns selected by `task_payload.input_keys` into the
/// context.
///
/// Dependency-free; usually the first node of a graph, feeding
/// context-sourced nodes and task handlers.
#[derive(Debug, Default)]
pub struct ExtracterNode;

impl ExtracterNode {
  /// Creates an extracter node.
  #[must_use]
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl LlmNode for ExtracterNode {
  async fn execute(
    &self,
    context: &ExecutionContext,
    task: &Task,
  ) -> Result<NodeResult, NodeExecutionError> {
    let keys = task.payload_string_list(INPUT_KEYS).ok_or_else(|| {
      NodeExecutionError::InvalidTaskPayload {
        key: INPUT_KEYS.to_string(),
      }
    })?;
    if keys.is_empty() {
      return Err(NodeExecutionError::InvalidTaskPayload {
        key: INPUT_KEYS.to_string(),
      });
    }

    let mut columns = BTreeMap::new();
    for key in &keys {
      let cells =
        context
          .payload()
          .column(key)
          .ok_or_else(|| NodeExecutionError::MissingColumn {
            column: key.clone(),
          })?;
      columns.insert(key.clone(), cells.to_vec());
    }

    if keys.len() == 1 {
      let only = columns
        .remove(&keys[0])
        .unwrap_or_default();
      Ok(NodeResult::Column(only))
    } else {
      Ok(NodeResult::Table(columns))
    }
  }
}
