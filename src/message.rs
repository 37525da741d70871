//! # Message Capability
//!
//! The engine never depends on a concrete message type from the surrounding
//! pipeline. It only needs three capabilities from whatever flows through:
//! an attached [`Task`], a tabular payload, and a replace-not-mutate payload
//! swap. [`EngineMessage`] captures exactly that surface, and
//! [`ControlMessage`] is the in-crate implementation used by the stage
//! adapter and the tests.

use crate::table::TablePayload;
use crate::task::Task;

/// Capability interface the engine requires of a message.
///
/// `with_payload` must return a *new* message; the engine relies on the
/// original message staying untouched so that a failed run leaves no visible
/// trace on upstream state.
pub trait EngineMessage: Send + Sync {
  /// Returns the task attached to this message.
  fn task(&self) -> &Task;

  /// Returns the tabular payload carried by this message.
  fn payload(&self) -> &TablePayload;

  /// Returns a new message carrying `payload`, preserving the task.
  #[must_use]
  fn with_payload(&self, payload: TablePayload) -> Self;
}

/// A task-bearing message with a tabular payload.
///
/// The concrete message type used at the crate boundary. The surrounding
/// pipeline may use its own message type instead by implementing
/// [`EngineMessage`].
#[derive(Clone, Debug, PartialEq)]
pub struct ControlMessage {
  task: Task,
  payload: TablePayload,
}

impl ControlMessage {
  /// Creates a message from a task and a payload.
  #[must_use]
  pub fn new(task: Task, payload: TablePayload) -> Self {
    Self { task, payload }
  }
}

impl EngineMessage for ControlMessage {
  fn task(&self) -> &Task {
    &self.task
  }

  fn payload(&self) -> &TablePayload {
    &self.payload
  }

  fn with_payload(&self, payload: TablePayload) -> Self {
    Self {
      task: self.task.clone(),
      payload,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_with_payload_preserves_task_and_original() {
    let task = Task::with_type("llm_engine");
    let payload =
      TablePayload::from_columns(vec![("log".to_string(), vec![json!("err1")])]).unwrap();
    let message = ControlMessage::new(task.clone(), payload.clone());

    let swapped = message.with_payload(
      payload
        .with_columns(vec![("response".to_string(), vec![json!("r1")])])
        .unwrap(),
    );

    assert_eq!(swapped.task(), &task);
    assert!(swapped.payload().column("response").is_some());
    // Replace, not mutate: the original message is unchanged.
    assert_eq!(message.payload(), &payload);
  }
}
