//! # Execution Context
//!
//! Per-run storage for intermediate node results. One context is created at
//! the start of every engine run, is owned exclusively by that run, and is
//! dropped when the run finishes - nothing in it survives across messages,
//! which is what makes concurrently in-flight runs safe without any locking.
//!
//! ## Write-once discipline
//!
//! Each registered node writes exactly one entry, under its own path, exactly
//! once per run. Reads may happen any number of times by downstream nodes and
//! task handlers. The builder guarantees unique paths, so a double write can
//! only mean an engine bug; [`ExecutionContext::insert`] guards it with a
//! debug assertion.

use crate::path::NodePath;
use crate::table::TablePayload;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// The value a node stores under its registered path.
///
/// Results are usually per-row collections aligned with the message's rows:
/// a single extracted or derived column, or several named columns when a
/// node pulls more than one input key at once.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeResult {
  /// One value per message row.
  Column(Vec<Value>),
  /// Several named per-row columns (multi-key extraction shape).
  Table(BTreeMap<String, Vec<Value>>),
}

impl NodeResult {
  /// Returns the per-row cells if this result is a single column.
  #[must_use]
  pub fn as_column(&self) -> Option<&[Value]> {
    match self {
      NodeResult::Column(cells) => Some(cells),
      NodeResult::Table(_) => None,
    }
  }

  /// Returns the named columns if this result is a table.
  #[must_use]
  pub fn as_table(&self) -> Option<&BTreeMap<String, Vec<Value>>> {
    match self {
      NodeResult::Column(_) => None,
      NodeResult::Table(columns) => Some(columns),
    }
  }
}

/// Per-run mutable store of named intermediate results.
///
/// Nodes and task handlers receive the context as a shared read view; only
/// the engine writes to it, committing each node's result after the node
/// completes. The context also carries a snapshot of the incoming message's
/// tabular payload so message-sourced nodes can read input columns without
/// touching the message itself.
#[derive(Debug)]
pub struct ExecutionContext {
  payload: TablePayload,
  results: HashMap<NodePath, NodeResult>,
}

impl ExecutionContext {
  /// Creates a fresh context over a snapshot of the incoming payload.
  #[must_use]
  pub fn new(payload: TablePayload) -> Self {
    Self {
      payload,
      results: HashMap::new(),
    }
  }

  /// Returns the incoming message's tabular payload.
  #[must_use]
  pub fn payload(&self) -> &TablePayload {
    &self.payload
  }

  /// Returns the row count of the incoming payload.
  #[must_use]
  pub fn row_count(&self) -> usize {
    self.payload.row_count()
  }

  /// Looks up the result stored under a path, if that node has run.
  #[must_use]
  pub fn get(&self, path: &NodePath) -> Option<&NodeResult> {
    self.results.get(path)
  }

  /// Commits a node's result under its path.
  ///
  /// Each path is written at most once per run; the builder's duplicate-name
  /// rejection makes a second write unreachable through the public API.
  pub(crate) fn insert(&mut self, path: NodePath, result: NodeResult) {
    let previous = self.results.insert(path, result);
    debug_assert!(previous.is_none(), "context entry written twice in one run");
  }
}
