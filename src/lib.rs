//! # InferWeave
//!
//! Node-graph execution engine that augments streaming tabular messages with
//! results produced by composable processing nodes (including LLM-style
//! external calls) and task-specific output handlers.
//!
//! The crate is one stage's core inside a larger linear pipeline: given a
//! declared graph of named nodes and task handlers plus one incoming
//! task-bearing message, it resolves a valid execution order, runs each node
//! with its declared inputs, accumulates outputs into a per-message execution
//! context, and hands the finished context to the task handlers that produce
//! the outgoing message.
//!
//! ## Key Properties
//!
//! - **Validated once, run forever**: the graph registry is checked for
//!   duplicate names, unresolved dependencies, cycles, and handler output
//!   collisions at build time; runs never hit a structural error.
//! - **Lock-free concurrency**: the built engine is immutable and shared;
//!   all per-run state lives in a context owned by exactly one run.
//! - **Suspension-friendly**: nodes are async, so an external model call in
//!   one run never stalls another run's local computation.
//! - **Replace, not mutate**: the incoming message is read-only; output is a
//!   new message, so a failed run leaves no visible trace upstream.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inferweave::engine::LlmEngine;
//! use inferweave::handlers::SimpleTaskHandler;
//! use inferweave::message::{ControlMessage, EngineMessage};
//! use inferweave::nodes::ExtracterNode;
//! use inferweave::table::TablePayload;
//! use inferweave::task::Task;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = LlmEngine::builder()
//!   .add_node("extracter", ExtracterNode::new())?
//!   .add_task_handler(&["/extracter"], SimpleTaskHandler::new())?
//!   .build()?;
//!
//! let message = ControlMessage::new(
//!   Task::new("llm_engine", json!({"input_keys": ["log"]}))?,
//!   TablePayload::from_columns(vec![(
//!     "log".to_string(),
//!     vec![json!("err1"), json!("err2")],
//!   )])?,
//! );
//!
//! let outgoing = engine.run(&message).await?;
//! assert_eq!(
//!   outgoing.payload().column("response").unwrap(),
//!   [json!("err1"), json!("err2")]
//! );
//! # Ok(())
//! # }
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Engine builder: the declared graph registry and its validation.
pub mod builder;
/// Per-run execution context and node result values.
pub mod context;
/// The engine: wave-ordered node execution and task handler dispatch.
pub mod engine;
/// Definition-time and run-time error taxonomy.
pub mod error;
/// Task handler contract.
pub mod handler;
/// Built-in task handlers.
pub mod handlers;
/// Message capability interface and the in-crate control message.
pub mod message;
/// Node contract.
pub mod node;
/// Built-in nodes.
pub mod nodes;
/// Slash-prefixed node result paths.
pub mod path;
/// Stage adapter between the pipeline and the engine.
pub mod stage;
/// Column-oriented tabular message payloads.
pub mod table;
/// The task attached to incoming messages.
pub mod task;

#[cfg(test)]
mod engine_test;

pub use builder::EngineBuilder;
pub use context::{ExecutionContext, NodeResult};
pub use engine::LlmEngine;
pub use error::{DefinitionError, EngineRunError};
pub use handler::{HandlerExecutionError, TaskHandler};
pub use message::{ControlMessage, EngineMessage};
pub use node::{LlmNode, NodeExecutionError};
pub use path::NodePath;
pub use stage::LlmEngineStage;
pub use table::{TableError, TablePayload};
pub use task::{Task, TaskPayloadError};
