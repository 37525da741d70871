//! # Simple Task Handler
//!
//! Copies context results into named message columns, one output column per
//! registered input path. With the default configuration it reads a single
//! path and writes the conventional `response` column, which is the common
//! tail of an LLM graph: extract, generate, hand the generation back as a
//! column.

use crate::context::ExecutionContext;
use crate::handler::{HandlerExecutionError, TaskHandler};
use crate::path::NodePath;
use crate::table::TablePayload;
use crate::task::Task;
use async_trait::async_trait;

/// Default output column name.
pub const RESPONSE_COLUMN: &str = "response";

/// Writes each registered input path into one declared output column.
///
/// The handler zips its registered input paths with its output columns in
/// order, so it must be registered with exactly as many inputs as it
/// declares columns. Every input must be a per-row column whose length
/// matches the message's row count.
#[derive(Debug)]
pub struct SimpleTaskHandler {
  output_columns: Vec<String>,
}

impl SimpleTaskHandler {
  /// Creates a handler writing the single `response` column.
  #[must_use]
  pub fn new() -> Self {
    Self {
      output_columns: vec![RESPONSE_COLUMN.to_string()],
    }
  }

  /// Replaces the declared output columns.
  #[must_use]
  pub fn with_output_columns(mut self, columns: Vec<String>) -> Self {
    self.output_columns = columns;
    self
  }
}

impl Default for SimpleTaskHandler {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl TaskHandler for SimpleTaskHandler {
  fn output_columns(&self) -> Vec<String> {
    self.output_columns.clone()
  }

  async fn handle(
    &self,
    inputs: &[NodePath],
    context: &ExecutionContext,
    _task: &Task,
    payload: TablePayload,
  ) -> Result<TablePayload, HandlerExecutionError> {
    if inputs.len() != self.output_columns.len() {
      return Err(HandlerExecutionError::OutputArity {
        inputs: inputs.len(),
        outputs: self.output_columns.len(),
      });
    }

    let rows = payload.row_count();
    let mut columns = Vec::with_capacity(inputs.len());
    for (path, column) in inputs.iter().zip(&self.output_columns) {
      let result = context
        .get(path)
        .ok_or_else(|| HandlerExecutionError::MissingInput { path: path.clone() })?;
      let cells = result
        .as_column()
        .ok_or_else(|| HandlerExecutionError::NotAColumn { path: path.clone() })?;
      if cells.len() != rows {
        return Err(HandlerExecutionError::RowCountMismatch {
          path: path.clone(),
          expected: rows,
          actual: cells.len(),
        });
      }
      columns.push((column.clone(), cells.to_vec()));
    }

    Ok(payload.with_columns(columns)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::context::NodeResult;
  use serde_json::json;

  fn context() -> ExecutionContext {
    let payload = TablePayload::from_columns(vec![(
      "log".to_string(),
      vec![json!("err1"), json!("err2")],
    )])
    .unwrap();
    let mut context = ExecutionContext::new(payload);
    context.insert(
      NodePath::parse("/extracter").unwrap(),
      NodeResult::Column(vec![json!("err1"), json!("err2")]),
    );
    context.insert(
      NodePath::parse("/short").unwrap(),
      NodeResult::Column(vec![json!("only-one")]),
    );
    context
  }

  #[tokio::test]
  async fn test_writes_response_column() {
    let context = context();
    let handler = SimpleTaskHandler::new();
    let inputs = [NodePath::parse("/extracter").unwrap()];
    let task = Task::with_type("llm_engine");

    let out = handler
      .handle(&inputs, &context, &task, context.payload().clone())
      .await
      .unwrap();
    assert_eq!(
      out.column("response").unwrap(),
      [json!("err1"), json!("err2")]
    );
    assert_eq!(out.column("log").unwrap(), [json!("err1"), json!("err2")]);
  }

  #[tokio::test]
  async fn test_missing_input_path() {
    let context = context();
    let handler = SimpleTaskHandler::new();
    let inputs = [NodePath::parse("/absent").unwrap()];
    let task = Task::with_type("llm_engine");

    let err = handler
      .handle(&inputs, &context, &task, context.payload().clone())
      .await
      .unwrap_err();
    assert!(matches!(err, HandlerExecutionError::MissingInput { .. }));
  }

  #[tokio::test]
  async fn test_row_count_mismatch() {
    let context = context();
    let handler = SimpleTaskHandler::new();
    let inputs = [NodePath::parse("/short").unwrap()];
    let task = Task::with_type("llm_engine");

    let err = handler
      .handle(&inputs, &context, &task, context.payload().clone())
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      HandlerExecutionError::RowCountMismatch {
        expected: 2,
        actual: 1,
        ..
      }
    ));
  }

  #[tokio::test]
  async fn test_input_output_arity_mismatch() {
    let context = context();
    let handler = SimpleTaskHandler::new();
    let inputs = [
      NodePath::parse("/extracter").unwrap(),
      NodePath::parse("/short").unwrap(),
    ];
    let task = Task::with_type("llm_engine");

    let err = handler
      .handle(&inputs, &context, &task, context.payload().clone())
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      HandlerExecutionError::OutputArity {
        inputs: 2,
        outputs: 1,
      }
    ));
  }
}
