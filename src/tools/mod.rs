//! Tools exposed through the dispatcher.

pub mod todo;

pub use todo::todo_registry;
