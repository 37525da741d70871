//! # Task
//!
//! The task attached to an incoming message. A task names the kind of work a
//! message is requesting (`task_type`) and carries a loosely typed payload
//! that configures nodes and task handlers for that one message (for example
//! which input columns a message-sourced node should extract).
//!
//! The payload is a JSON object rather than a typed struct because its shape
//! is owned by whichever nodes and handlers are registered on the engine; the
//! engine itself never interprets it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error type for task construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task payload must be a JSON object, not {found}")]
pub struct TaskPayloadError {
  /// The JSON type actually supplied.
  pub found: &'static str,
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

/// The unit of work attached to a message.
///
/// A `Task` is carried by every message entering the engine. The stage
/// adapter uses `task_type` to decide whether a message is addressed to its
/// engine at all; nodes and handlers read per-message configuration out of
/// `task_payload`.
///
/// # Example
///
/// ```rust
/// use inferweave::task::Task;
/// use serde_json::json;
///
/// let task = Task::new("llm_engine", json!({"input_keys": ["log"]}))?;
/// assert_eq!(task.task_type(), "llm_engine");
/// # Ok::<(), inferweave::task::TaskPayloadError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
  task_type: String,
  task_payload: Map<String, Value>,
}

impl Task {
  /// Creates a new task with the given type and payload.
  ///
  /// # Arguments
  ///
  /// * `task_type` - The kind of work requested (e.g. `"llm_engine"`)
  /// * `payload` - Per-message configuration; must be a JSON object
  ///
  /// # Errors
  ///
  /// Returns [`TaskPayloadError`] if `payload` is not a JSON object, so a
  /// malformed task configuration fails where it is written rather than
  /// mid-run when a node goes looking for its entries.
  pub fn new(task_type: impl Into<String>, payload: Value) -> Result<Self, TaskPayloadError> {
    let task_payload = match payload {
      Value::Object(map) => map,
      other => {
        return Err(TaskPayloadError {
          found: json_kind(&other),
        });
      }
    };
    Ok(Self {
      task_type: task_type.into(),
      task_payload,
    })
  }

  /// Creates a task with an empty payload.
  #[must_use]
  pub fn with_type(task_type: impl Into<String>) -> Self {
    Self {
      task_type: task_type.into(),
      task_payload: Map::new(),
    }
  }

  /// Returns the task type.
  #[must_use]
  pub fn task_type(&self) -> &str {
    &self.task_type
  }

  /// Returns the raw task payload object.
  #[must_use]
  pub fn payload(&self) -> &Map<String, Value> {
    &self.task_payload
  }

  /// Looks up a single payload entry by key.
  #[must_use]
  pub fn payload_value(&self, key: &str) -> Option<&Value> {
    self.task_payload.get(key)
  }

  /// Reads a payload entry as a list of strings.
  ///
  /// This is the shape used by `input_keys`-style configuration. Returns
  /// `None` if the key is absent, not an array, or contains a non-string
  /// element.
  #[must_use]
  pub fn payload_string_list(&self, key: &str) -> Option<Vec<String>> {
    let values = self.task_payload.get(key)?.as_array()?;
    values
      .iter()
      .map(|v| v.as_str().map(str::to_string))
      .collect()
  }
}
