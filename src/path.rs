//! # Node Paths
//!
//! Slash-prefixed names under which node results are addressed, e.g.
//! `/extracter`. Dependencies between nodes and the inputs of task handlers
//! are declared as paths, so path validity is checked once at parse time and
//! the rest of the crate can treat a [`NodePath`] as known-good.
//!
//! Paths are hierarchical (`/outer/inner` is valid) even though a flat
//! engine only ever produces single-segment paths; nested engines address
//! their inner nodes with deeper paths.

use std::fmt;
use thiserror::Error;

/// Error type for node path parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid node path '{input}': {reason}")]
pub struct PathParseError {
  /// The rejected input.
  pub input: String,
  /// Why it was rejected.
  pub reason: &'static str,
}

/// A validated, slash-prefixed node result path.
///
/// A `NodePath` always starts with `/` and contains one or more non-empty,
/// whitespace-free segments. The output of a node registered under `name`
/// lives at `/name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(String);

impl NodePath {
  /// Parses a slash-prefixed path string.
  ///
  /// # Errors
  ///
  /// Returns [`PathParseError`] if the input does not start with `/`, has an
  /// empty segment, or contains whitespace.
  pub fn parse(input: &str) -> Result<Self, PathParseError> {
    let reject = |reason| PathParseError {
      input: input.to_string(),
      reason,
    };

    let Some(rest) = input.strip_prefix('/') else {
      return Err(reject("must start with '/'"));
    };
    if rest.is_empty() {
      return Err(reject("must have at least one segment"));
    }
    for segment in rest.split('/') {
      if segment.is_empty() {
        return Err(reject("segments must be non-empty"));
      }
      if segment.chars().any(char::is_whitespace) {
        return Err(reject("segments must not contain whitespace"));
      }
    }
    Ok(Self(input.to_string()))
  }

  /// Builds the path a node registered under `name` is stored at.
  ///
  /// # Errors
  ///
  /// Returns [`PathParseError`] if `name` is empty or contains `/` or
  /// whitespace.
  pub fn from_name(name: &str) -> Result<Self, PathParseError> {
    if name.contains('/') {
      return Err(PathParseError {
        input: name.to_string(),
        reason: "node names must not contain '/'",
      });
    }
    Self::parse(&format!("/{name}"))
  }

  /// Returns the path as a string slice, including the leading slash.
  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for NodePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
