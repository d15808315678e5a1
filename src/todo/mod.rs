//! Todo model and the remote store client.
//!
//! The todo list itself lives in an external REST service. This process
//! never keeps a durable copy: [`Todo`] values only exist as request and
//! response payloads.

pub mod client;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use client::{HttpTodoStore, TodoStore};

/// Identifier assigned by the external store.
///
/// Front ends disagree on whether ids are numbers or strings, so both decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TodoId {
    Int(i64),
    Text(String),
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for TodoId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

/// A single todo item as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_todo_id_decodes_numbers_and_strings() {
        let numeric: Todo =
            serde_json::from_value(json!({"id": 7, "title": "a", "completed": true})).unwrap();
        assert_eq!(numeric.id, TodoId::Int(7));

        let text: Todo = serde_json::from_value(json!({"id": "abc", "title": "b"})).unwrap();
        assert_eq!(text.id, TodoId::Text("abc".into()));
        assert!(!text.completed);
    }

    #[test]
    fn test_todo_id_display_is_path_safe() {
        assert_eq!(TodoId::from(42).to_string(), "42");
        assert_eq!(TodoId::from("x-1").to_string(), "x-1");
    }
}
