//! Built-in nodes for common graph shapes.
//!
//! Two nodes ship with the crate, one per input mode: the message-sourced
//! [`ExtracterNode`] and the context-sourced [`CompletionNode`]. Anything
//! else is expected to come from downstream crates implementing
//! [`crate::node::LlmNode`].

pub mod completion_node;
pub mod extracter_node;

pub use completion_node::{CompletionBackend, CompletionError, CompletionNode};
pub use extracter_node::ExtracterNode;
