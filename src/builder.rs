//! # Engine Builder
//!
//! The builder is the graph registry: the declared set of named nodes and
//! task handlers plus the dependency edges between them, expressed as
//! slash-prefixed path references.
//!
//! ## Validation model
//!
//! The registry is built once, typically at pipeline construction, and then
//! reused for every message, so every structural violation is reported here
//! and never at run time:
//!
//! - ill-formed names and paths, and duplicate node names, are rejected by
//!   the individual `add_*` calls;
//! - colliding handler output columns are rejected by `add_task_handler`;
//! - unresolved dependencies and cycles are rejected by [`EngineBuilder::build`],
//!   which is also what makes forward references between `add_node` calls
//!   legal.
//!
//! `build` resolves the path-addressed graph into an integer-indexed arena
//! and precomputes the execution waves, so runs never do string lookups.

use crate::engine::{HandlerSlot, LlmEngine, NodeSlot};
use crate::error::DefinitionError;
use crate::handler::TaskHandler;
use crate::node::LlmNode;
use crate::path::NodePath;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

struct NodeRegistration {
  name: String,
  path: NodePath,
  node: Arc<dyn LlmNode>,
  dependencies: Vec<NodePath>,
}

struct HandlerRegistration {
  inputs: Vec<NodePath>,
  handler: Arc<dyn TaskHandler>,
}

/// Builder for an [`LlmEngine`].
///
/// # Example
///
/// ```rust,no_run
/// use inferweave::builder::EngineBuilder;
/// use inferweave::handlers::SimpleTaskHandler;
/// use inferweave::nodes::ExtracterNode;
///
/// # fn example() -> Result<(), inferweave::error::DefinitionError> {
/// let engine = EngineBuilder::new()
///   .add_node("extracter", ExtracterNode::new())?
///   .add_task_handler(&["/extracter"], SimpleTaskHandler::new())?
///   .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct EngineBuilder {
  nodes: Vec<NodeRegistration>,
  handlers: Vec<HandlerRegistration>,
  claimed_columns: Vec<String>,
}

impl fmt::Debug for EngineBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EngineBuilder")
      .field(
        "nodes",
        &self
          .nodes
          .iter()
          .map(|registration| registration.name.as_str())
          .collect::<Vec<_>>(),
      )
      .field("handlers", &self.handlers.len())
      .field("claimed_columns", &self.claimed_columns)
      .finish_non_exhaustive()
  }
}

impl EngineBuilder {
  /// Creates an empty builder.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a dependency-free node under `name`.
  ///
  /// The node's result will be stored at `/name`.
  ///
  /// # Errors
  ///
  /// Returns [`DefinitionError::InvalidPath`] for an ill-formed name and
  /// [`DefinitionError::DuplicateNodeName`] if the name is already taken.
  pub fn add_node(
    self,
    name: impl Into<String>,
    node: impl LlmNode + 'static,
  ) -> Result<Self, DefinitionError> {
    self.add_node_with_deps(name, node, &[])
  }

  /// Registers a node with declared upstream dependencies.
  ///
  /// Dependencies are slash-prefixed paths (`"/extracter"`). They may refer
  /// to nodes registered later; resolution happens in [`EngineBuilder::build`].
  ///
  /// # Errors
  ///
  /// Returns [`DefinitionError::InvalidPath`] for an ill-formed name or
  /// dependency path, and [`DefinitionError::DuplicateNodeName`] if the name
  /// is already taken.
  pub fn add_node_with_deps(
    mut self,
    name: impl Into<String>,
    node: impl LlmNode + 'static,
    dependencies: &[&str],
  ) -> Result<Self, DefinitionError> {
    let name = name.into();
    let path = NodePath::from_name(&name)?;
    if self.nodes.iter().any(|n| n.name == name) {
      return Err(DefinitionError::DuplicateNodeName { name });
    }
    let dependencies = dependencies
      .iter()
      .map(|dep| NodePath::parse(dep))
      .collect::<Result<Vec<_>, _>>()?;
    self.nodes.push(NodeRegistration {
      name,
      path,
      node: Arc::new(node),
      dependencies,
    });
    Ok(self)
  }

  /// Registers a task handler reading the given context paths.
  ///
  /// All registered handlers run on every matching message, in registration
  /// order, each against the same finished context.
  ///
  /// # Errors
  ///
  /// Returns [`DefinitionError::InvalidPath`] for an ill-formed input path
  /// and [`DefinitionError::HandlerOutputCollision`] if the handler declares
  /// an output column already claimed by an earlier handler (or declares the
  /// same column twice itself).
  pub fn add_task_handler(
    mut self,
    inputs: &[&str],
    handler: impl TaskHandler + 'static,
  ) -> Result<Self, DefinitionError> {
    let inputs = inputs
      .iter()
      .map(|input| NodePath::parse(input))
      .collect::<Result<Vec<_>, _>>()?;
    for column in handler.output_columns() {
      if self.claimed_columns.contains(&column) {
        return Err(DefinitionError::HandlerOutputCollision { column });
      }
      self.claimed_columns.push(column);
    }
    self.handlers.push(HandlerRegistration {
      inputs,
      handler: Arc::new(handler),
    });
    Ok(self)
  }

  /// Validates the registry and freezes it into an immutable engine.
  ///
  /// Resolves every declared dependency path to a registered node, orders
  /// the nodes into execution waves (Kahn's algorithm, with registration
  /// order as the deterministic tie-break inside a wave), and indexes
  /// everything by integer so the run path is lookup-free.
  ///
  /// # Errors
  ///
  /// Returns [`DefinitionError::UnresolvedDependency`] if a node or handler
  /// references a path no registered node provides, and
  /// [`DefinitionError::Cycle`] if the dependency relation is not a DAG.
  pub fn build(self) -> Result<LlmEngine, DefinitionError> {
    let index_by_path: HashMap<&NodePath, usize> = self
      .nodes
      .iter()
      .enumerate()
      .map(|(index, registration)| (&registration.path, index))
      .collect();

    let mut slots = Vec::with_capacity(self.nodes.len());
    for registration in &self.nodes {
      let mut dependencies = Vec::with_capacity(registration.dependencies.len());
      for dep in &registration.dependencies {
        let index =
          *index_by_path
            .get(dep)
            .ok_or_else(|| DefinitionError::UnresolvedDependency {
              referrer: format!("node '{}'", registration.name),
              path: dep.clone(),
            })?;
        dependencies.push(index);
      }
      slots.push(NodeSlot {
        name: registration.name.clone(),
        path: registration.path.clone(),
        node: Arc::clone(&registration.node),
        dependencies,
      });
    }

    let mut handler_slots = Vec::with_capacity(self.handlers.len());
    for (position, registration) in self.handlers.iter().enumerate() {
      for input in &registration.inputs {
        if !index_by_path.contains_key(input) {
          return Err(DefinitionError::UnresolvedDependency {
            referrer: format!("task handler #{position}"),
            path: input.clone(),
          });
        }
      }
      handler_slots.push(HandlerSlot {
        inputs: registration.inputs.clone(),
        handler: Arc::clone(&registration.handler),
      });
    }

    let waves = execution_waves(&slots)?;
    Ok(LlmEngine::from_parts(slots, waves, handler_slots))
  }
}

/// Orders node indices into execution waves using Kahn's algorithm.
///
/// Every node in a wave has all its dependencies satisfied by earlier waves,
/// so wave members are free to run concurrently. Within a wave, indices are
/// in registration order, which keeps the overall order deterministic.
fn execution_waves(slots: &[NodeSlot]) -> Result<Vec<Vec<usize>>, DefinitionError> {
  let mut dependants: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
  let mut in_degree: Vec<usize> = vec![0; slots.len()];
  for (index, slot) in slots.iter().enumerate() {
    in_degree[index] = slot.dependencies.len();
    for &dep in &slot.dependencies {
      dependants[dep].push(index);
    }
  }

  let mut waves = Vec::new();
  let mut ready: Vec<usize> = (0..slots.len()).filter(|&i| in_degree[i] == 0).collect();
  let mut ordered = 0;
  while !ready.is_empty() {
    ordered += ready.len();
    let mut next = Vec::new();
    for &index in &ready {
      for &dependant in &dependants[index] {
        in_degree[dependant] -= 1;
        if in_degree[dependant] == 0 {
          next.push(dependant);
        }
      }
    }
    next.sort_unstable();
    waves.push(std::mem::replace(&mut ready, next));
  }

  if ordered != slots.len() {
    let unordered = slots
      .iter()
      .enumerate()
      .filter(|(index, _)| in_degree[*index] > 0)
      .map(|(_, slot)| slot.name.clone())
      .collect();
    return Err(DefinitionError::Cycle { unordered });
  }
  Ok(waves)
}
