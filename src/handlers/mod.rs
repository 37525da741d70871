//! Built-in task handlers.

pub mod simple_task_handler;

pub use simple_task_handler::SimpleTaskHandler;
