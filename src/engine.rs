//! # Engine
//!
//! The engine orchestrates one run: it creates a fresh
//! [`ExecutionContext`] over the incoming message's payload, drives every
//! registered node in dependency order, then invokes every task handler
//! against the finished context and returns the outgoing message.
//!
//! ## Concurrency model
//!
//! The engine is immutable after [`EngineBuilder::build`] and holds no per-run
//! state, so a single instance (usually behind an `Arc`) serves arbitrarily
//! many concurrently in-flight messages without synchronization. All mutable
//! state for a run lives in that run's own context.
//!
//! Within one run, nodes execute wave by wave: a wave is the set of nodes
//! whose dependencies were all satisfied by earlier waves, and its members
//! run concurrently via `try_join_all`. A node therefore never starts before
//! every node it depends on has completed and committed its context entry,
//! while independent nodes overlap - including a node suspended on an
//! external model call.
//!
//! ## Failure behavior
//!
//! The first node or handler error aborts the run: in-flight sibling futures
//! are dropped, the context is discarded, and a single
//! [`EngineRunError`] naming the failing component is returned. The incoming
//! message is never mutated, on success or failure.
//!
//! [`EngineBuilder::build`]: crate::builder::EngineBuilder::build

use crate::builder::EngineBuilder;
use crate::context::ExecutionContext;
use crate::error::EngineRunError;
use crate::handler::TaskHandler;
use crate::message::EngineMessage;
use crate::node::LlmNode;
use crate::path::NodePath;
use futures::future::try_join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A registered node, resolved to integer-indexed dependencies.
pub(crate) struct NodeSlot {
  /// The name the node was registered under.
  pub(crate) name: String,
  /// The context path the node's result is stored at (`/name`).
  pub(crate) path: NodePath,
  /// The node itself.
  pub(crate) node: Arc<dyn LlmNode>,
  /// Indices of the nodes this node reads from.
  pub(crate) dependencies: Vec<usize>,
}

/// A registered task handler with its declared input paths.
pub(crate) struct HandlerSlot {
  /// The context paths the handler reads, in declaration order.
  pub(crate) inputs: Vec<NodePath>,
  /// The handler itself.
  pub(crate) handler: Arc<dyn TaskHandler>,
}

/// The node-graph execution engine.
///
/// Built once via [`LlmEngine::builder`], then shared read-only across all
/// runs. See the module docs for the execution and concurrency model.
pub struct LlmEngine {
  nodes: Vec<NodeSlot>,
  waves: Vec<Vec<usize>>,
  handlers: Vec<HandlerSlot>,
}

impl fmt::Debug for LlmEngine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LlmEngine")
      .field(
        "nodes",
        &self
          .nodes
          .iter()
          .map(|slot| slot.name.as_str())
          .collect::<Vec<_>>(),
      )
      .field("waves", &self.waves)
      .field("handlers", &self.handlers.len())
      .finish_non_exhaustive()
  }
}

impl LlmEngine {
  /// Returns a builder for declaring nodes and task handlers.
  #[must_use]
  pub fn builder() -> EngineBuilder {
    EngineBuilder::new()
  }

  pub(crate) fn from_parts(
    nodes: Vec<NodeSlot>,
    waves: Vec<Vec<usize>>,
    handlers: Vec<HandlerSlot>,
  ) -> Self {
    Self {
      nodes,
      waves,
      handlers,
    }
  }

  /// Returns the number of registered nodes.
  #[must_use]
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// Returns the number of registered task handlers.
  #[must_use]
  pub fn handler_count(&self) -> usize {
    self.handlers.len()
  }

  /// Runs the full graph against one message and returns the outgoing
  /// message.
  ///
  /// Every registered node executes (dependency order, one wave at a time),
  /// then every task handler runs in registration order, each receiving the
  /// payload produced by the previous one. The input message is read, never
  /// written; the result is a new message built with
  /// [`EngineMessage::with_payload`].
  ///
  /// # Errors
  ///
  /// Returns [`EngineRunError`] naming the failing node or handler. A failed
  /// run leaves no trace: the context is dropped and the incoming message is
  /// untouched.
  pub async fn run<M: EngineMessage>(&self, message: &M) -> Result<M, EngineRunError> {
    let task = message.task();
    let mut context = ExecutionContext::new(message.payload().clone());
    debug!(
      nodes = self.nodes.len(),
      handlers = self.handlers.len(),
      rows = context.row_count(),
      task_type = task.task_type(),
      "starting engine run"
    );

    for wave in &self.waves {
      let executions = wave.iter().map(|&index| {
        let slot = &self.nodes[index];
        let context = &context;
        async move {
          slot
            .node
            .execute(context, task)
            .await
            .map(|result| (index, result))
            .map_err(|source| EngineRunError::Node {
              name: slot.name.clone(),
              source,
            })
        }
      });
      let results = try_join_all(executions).await?;
      for (index, result) in results {
        let slot = &self.nodes[index];
        trace!(node = %slot.name, path = %slot.path, "node completed");
        context.insert(slot.path.clone(), result);
      }
    }

    let mut payload = context.payload().clone();
    for (index, slot) in self.handlers.iter().enumerate() {
      payload = slot
        .handler
        .handle(&slot.inputs, &context, task, payload)
        .await
        .map_err(|source| EngineRunError::Handler { index, source })?;
      trace!(handler = index, "task handler completed");
    }

    debug!(rows = payload.row_count(), "engine run finished");
    Ok(message.with_payload(payload))
  }
}
