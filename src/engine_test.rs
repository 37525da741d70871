//! # Engine Test Suite
//!
//! Covers the run contract: determinism, dependency ordering, deterministic
//! tie-breaking, cross-run isolation, row-count preservation, eager
//! execution of unreferenced nodes, multi-handler merging, and failure
//! wrapping.

use crate::context::{ExecutionContext, NodeResult};
use crate::engine::LlmEngine;
use crate::error::EngineRunError;
use crate::handlers::SimpleTaskHandler;
use crate::message::{ControlMessage, EngineMessage};
use crate::node::{LlmNode, NodeExecutionError};
use crate::nodes::{CompletionBackend, CompletionError, CompletionNode, ExtracterNode};
use crate::path::NodePath;
use crate::table::TablePayload;
use crate::task::Task;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Nodes
// ============================================================================

/// Node that records its name when executed and verifies that every
/// expected upstream entry is already fully written.
struct RecordingNode {
  name: &'static str,
  expects: Vec<NodePath>,
  log: Arc<Mutex<Vec<String>>>,
}

impl RecordingNode {
  fn new(name: &'static str, expects: &[&str], log: Arc<Mutex<Vec<String>>>) -> Self {
    Self {
      name,
      expects: expects
        .iter()
        .map(|path| NodePath::parse(path).unwrap())
        .collect(),
      log,
    }
  }
}

#[async_trait]
impl LlmNode for RecordingNode {
  async fn execute(
    &self,
    context: &ExecutionContext,
    _task: &Task,
  ) -> Result<NodeResult, NodeExecutionError> {
    for path in &self.expects {
      assert!(
        context.get(path).is_some(),
        "node '{}' ran before its dependency '{}' was written",
        self.name,
        path
      );
    }
    self.log.lock().unwrap().push(self.name.to_string());
    Ok(NodeResult::Column(vec![Value::Null; context.row_count()]))
  }
}

/// Node that counts invocations.
struct CountingNode {
  invocations: Arc<AtomicUsize>,
}

#[async_trait]
impl LlmNode for CountingNode {
  async fn execute(
    &self,
    context: &ExecutionContext,
    _task: &Task,
  ) -> Result<NodeResult, NodeExecutionError> {
    self.invocations.fetch_add(1, Ordering::SeqCst);
    Ok(NodeResult::Column(vec![Value::Null; context.row_count()]))
  }
}

/// Node that always fails.
struct FailingNode;

#[async_trait]
impl LlmNode for FailingNode {
  async fn execute(
    &self,
    _context: &ExecutionContext,
    _task: &Task,
  ) -> Result<NodeResult, NodeExecutionError> {
    Err(NodeExecutionError::MissingColumn {
      column: "nonexistent".to_string(),
    })
  }
}

/// Completion backend that prefixes every prompt.
struct PrefixBackend;

#[async_trait]
impl CompletionBackend for PrefixBackend {
  async fn complete(&self, prompts: &[String]) -> Result<Vec<String>, CompletionError> {
    Ok(prompts.iter().map(|p| format!("answer:{p}")).collect())
  }
}

// ============================================================================
// Helpers
// ============================================================================

fn log_message(keys: &[&str]) -> ControlMessage {
  let payload = TablePayload::from_columns(vec![
    ("log".to_string(), vec![json!("err1"), json!("err2")]),
    ("host".to_string(), vec![json!("h1"), json!("h2")]),
  ])
  .unwrap();
  ControlMessage::new(
    Task::new("llm_engine", json!({"input_keys": keys})).unwrap(),
    payload,
  )
}

fn extraction_engine() -> LlmEngine {
  LlmEngine::builder()
    .add_node("extracter", ExtracterNode::new())
    .unwrap()
    .add_task_handler(&["/extracter"], SimpleTaskHandler::new())
    .unwrap()
    .build()
    .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_run_is_deterministic() {
  let engine = extraction_engine();
  let message = log_message(&["log"]);

  let first = engine.run(&message).await.unwrap();
  let second = engine.run(&message).await.unwrap();

  let first_bytes = serde_json::to_vec(first.payload()).unwrap();
  let second_bytes = serde_json::to_vec(second.payload()).unwrap();
  assert_eq!(first_bytes, second_bytes);
  assert_eq!(
    first.payload().column("response").unwrap(),
    [json!("err1"), json!("err2")]
  );
}

#[tokio::test]
async fn test_dependency_ordering_is_honored() {
  let log = Arc::new(Mutex::new(Vec::new()));
  let engine = LlmEngine::builder()
    // Register in reverse dependency order to make the sort do the work.
    .add_node_with_deps("c", RecordingNode::new("c", &["/a", "/b"], log.clone()), &["/a", "/b"])
    .unwrap()
    .add_node_with_deps("b", RecordingNode::new("b", &["/a"], log.clone()), &["/a"])
    .unwrap()
    .add_node("a", RecordingNode::new("a", &[], log.clone()))
    .unwrap()
    .build()
    .unwrap();

  engine.run(&log_message(&["log"])).await.unwrap();
  assert_eq!(
    *log.lock().unwrap(),
    vec!["a".to_string(), "b".to_string(), "c".to_string()]
  );
}

#[tokio::test]
async fn test_unconstrained_nodes_run_in_registration_order() {
  let log = Arc::new(Mutex::new(Vec::new()));
  let engine = LlmEngine::builder()
    .add_node("x", RecordingNode::new("x", &[], log.clone()))
    .unwrap()
    .add_node("y", RecordingNode::new("y", &[], log.clone()))
    .unwrap()
    .add_node("z", RecordingNode::new("z", &[], log.clone()))
    .unwrap()
    .build()
    .unwrap();

  engine.run(&log_message(&["log"])).await.unwrap();
  assert_eq!(
    *log.lock().unwrap(),
    vec!["x".to_string(), "y".to_string(), "z".to_string()]
  );
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
  let engine = Arc::new(extraction_engine());
  let log_run = log_message(&["log"]);
  let host_run = log_message(&["host"]);

  let (first, second) = tokio::join!(engine.run(&log_run), engine.run(&host_run));
  let first = first.unwrap();
  let second = second.unwrap();

  // Each output reflects only its own task payload.
  assert_eq!(
    first.payload().column("response").unwrap(),
    [json!("err1"), json!("err2")]
  );
  assert_eq!(
    second.payload().column("response").unwrap(),
    [json!("h1"), json!("h2")]
  );
}

#[tokio::test]
async fn test_row_count_is_preserved() {
  let engine = extraction_engine();
  let message = log_message(&["log"]);
  let outgoing = engine.run(&message).await.unwrap();
  assert_eq!(outgoing.payload().row_count(), message.payload().row_count());
}

#[tokio::test]
async fn test_original_columns_are_preserved() {
  let engine = extraction_engine();
  let outgoing = engine.run(&log_message(&["log"])).await.unwrap();
  assert_eq!(
    outgoing.payload().column("log").unwrap(),
    [json!("err1"), json!("err2")]
  );
  assert_eq!(
    outgoing.payload().column("host").unwrap(),
    [json!("h1"), json!("h2")]
  );
}

#[tokio::test]
async fn test_node_failure_names_the_node() {
  let engine = LlmEngine::builder()
    .add_node("boom", FailingNode)
    .unwrap()
    .build()
    .unwrap();
  let message = log_message(&["log"]);
  let before = message.payload().clone();

  let err = engine.run(&message).await.unwrap_err();
  assert!(matches!(
    err,
    EngineRunError::Node { ref name, .. } if name == "boom"
  ));
  // A failed run must leave the incoming message untouched.
  assert_eq!(message.payload(), &before);
}

#[tokio::test]
async fn test_handler_failure_names_the_handler() {
  // Two input keys make the extracter produce a table, which the simple
  // handler cannot consume.
  let engine = extraction_engine();
  let err = engine
    .run(&log_message(&["log", "host"]))
    .await
    .unwrap_err();
  assert!(matches!(err, EngineRunError::Handler { index: 0, .. }));
}

#[tokio::test]
async fn test_unreferenced_node_still_executes() {
  let invocations = Arc::new(AtomicUsize::new(0));
  let engine = LlmEngine::builder()
    .add_node("extracter", ExtracterNode::new())
    .unwrap()
    .add_node(
      "inert",
      CountingNode {
        invocations: invocations.clone(),
      },
    )
    .unwrap()
    .add_task_handler(&["/extracter"], SimpleTaskHandler::new())
    .unwrap()
    .build()
    .unwrap();

  engine.run(&log_message(&["log"])).await.unwrap();
  assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_multiple_handlers_merge_disjoint_columns() {
  let engine = LlmEngine::builder()
    .add_node("extracter", ExtracterNode::new())
    .unwrap()
    .add_task_handler(&["/extracter"], SimpleTaskHandler::new())
    .unwrap()
    .add_task_handler(
      &["/extracter"],
      SimpleTaskHandler::new().with_output_columns(vec!["echo".to_string()]),
    )
    .unwrap()
    .build()
    .unwrap();

  let outgoing = engine.run(&log_message(&["log"])).await.unwrap();
  assert_eq!(
    outgoing.payload().column("response").unwrap(),
    [json!("err1"), json!("err2")]
  );
  assert_eq!(
    outgoing.payload().column("echo").unwrap(),
    [json!("err1"), json!("err2")]
  );
}

#[tokio::test]
async fn test_completion_chain_end_to_end() {
  // extracter -> completion -> handler, with the handler depending only on
  // the transitive tail of the chain.
  let engine = LlmEngine::builder()
    .add_node("extracter", ExtracterNode::new())
    .unwrap()
    .add_node_with_deps(
      "completion",
      CompletionNode::new(PrefixBackend, "/extracter").unwrap(),
      &["/extracter"],
    )
    .unwrap()
    .add_task_handler(&["/completion"], SimpleTaskHandler::new())
    .unwrap()
    .build()
    .unwrap();

  let outgoing = engine.run(&log_message(&["log"])).await.unwrap();
  assert_eq!(
    outgoing.payload().column("response").unwrap(),
    [json!("answer:err1"), json!("answer:err2")]
  );
}
