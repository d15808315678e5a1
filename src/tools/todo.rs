//! `addTodoItem`, `deleteTodoItem` and `updateTodoItem`.
//!
//! Handlers always answer with a text result. When the store call fails the
//! text says so and the result is flagged with `isError`, but the envelope
//! is still a success: the dispatcher never turns a store failure into a
//! JSON-RPC error.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::mcp::registry::{ToolDefinition, ToolHandler, ToolRegistry};
use crate::mcp::schema::{ParamKind, ParamSchema, ParamSpec};
use crate::mcp::types::ToolOutput;
use crate::notifier::ChangeFeed;
use crate::todo::{TodoId, TodoStore};

pub const ADD_TODO: &str = "addTodoItem";
pub const DELETE_TODO: &str = "deleteTodoItem";
pub const UPDATE_TODO: &str = "updateTodoItem";

/// Registry holding the three todo tools.
pub fn todo_registry(store: Arc<dyn TodoStore>, feed: ChangeFeed) -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(ToolDefinition::new(
            ADD_TODO,
            "Add a new todo item",
            ParamSchema::new().field(
                ParamSpec::required("title", ParamKind::String)
                    .min_length(1)
                    .describe("Title for new Todo"),
            ),
            Arc::new(AddTodoTool::new(Arc::clone(&store), feed.clone())),
        ))
        .with_tool(ToolDefinition::new(
            DELETE_TODO,
            "Delete a todo item",
            ParamSchema::new().field(
                ParamSpec::required("id", ParamKind::Number).describe("ID of the Todo to delete"),
            ),
            Arc::new(DeleteTodoTool::new(Arc::clone(&store), feed.clone())),
        ))
        .with_tool(ToolDefinition::new(
            UPDATE_TODO,
            "Update a todo item",
            ParamSchema::new()
                .field(
                    ParamSpec::required("id", ParamKind::Number)
                        .describe("ID of the Todo to update"),
                )
                .field(
                    ParamSpec::required("completed", ParamKind::Boolean)
                        .describe("Completion status of the Todo"),
                ),
            Arc::new(UpdateTodoTool::new(store, feed)),
        ))
}

/// Whole floats at or above this magnitude no longer fit an `i64`.
const FLOAT_ID_LIMIT: f64 = 9.2e18;

/// Numeric id argument; whole floats such as `3.0` are accepted.
#[allow(clippy::cast_possible_truncation)]
fn todo_id(args: &Value) -> Option<TodoId> {
    let Value::Number(n) = &args["id"] else {
        return None;
    };
    let id = if n.is_f64() {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < FLOAT_ID_LIMIT)
            .map(|f| f as i64)?
    } else {
        match n.as_i64() {
            Some(id) => id,
            None => i64::try_from(n.as_u64()?).ok()?,
        }
    };
    Some(TodoId::Int(id))
}

/// Push the refreshed list to subscribers after a successful mutation.
async fn broadcast_list(store: &dyn TodoStore, feed: &ChangeFeed) {
    if feed.publish_todos(store).await.is_none() {
        warn!(name: "todo.snapshot.failed", "could not refresh todo list for subscribers");
    }
}

#[derive(Debug)]
pub struct AddTodoTool {
    store: Arc<dyn TodoStore>,
    feed: ChangeFeed,
}

impl AddTodoTool {
    pub fn new(store: Arc<dyn TodoStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }
}

#[async_trait]
impl ToolHandler for AddTodoTool {
    async fn call(&self, args: Value) -> anyhow::Result<ToolOutput> {
        let title = args["title"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing title"))?;

        match self.store.create(title).await {
            Some(todo) => {
                info!(name: "todo.added", id = %todo.id, title);
                broadcast_list(self.store.as_ref(), &self.feed).await;
                Ok(ToolOutput::text(format!("Added todo '{title}'")))
            }
            None => Ok(ToolOutput::error(format!("Failed to add todo '{title}'"))),
        }
    }
}

#[derive(Debug)]
pub struct DeleteTodoTool {
    store: Arc<dyn TodoStore>,
    feed: ChangeFeed,
}

impl DeleteTodoTool {
    pub fn new(store: Arc<dyn TodoStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }
}

#[async_trait]
impl ToolHandler for DeleteTodoTool {
    async fn call(&self, args: Value) -> anyhow::Result<ToolOutput> {
        let Some(id) = todo_id(&args) else {
            return Ok(ToolOutput::error(format!("Invalid todo id {}", args["id"])));
        };

        if self.store.delete(&id).await {
            info!(name: "todo.deleted", id = %id);
            broadcast_list(self.store.as_ref(), &self.feed).await;
            Ok(ToolOutput::text(format!("Deleted todo {id}")))
        } else {
            Ok(ToolOutput::error(format!("Failed to delete todo {id}")))
        }
    }
}

#[derive(Debug)]
pub struct UpdateTodoTool {
    store: Arc<dyn TodoStore>,
    feed: ChangeFeed,
}

impl UpdateTodoTool {
    pub fn new(store: Arc<dyn TodoStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }
}

#[async_trait]
impl ToolHandler for UpdateTodoTool {
    async fn call(&self, args: Value) -> anyhow::Result<ToolOutput> {
        let Some(id) = todo_id(&args) else {
            return Ok(ToolOutput::error(format!("Invalid todo id {}", args["id"])));
        };
        let completed = args["completed"]
            .as_bool()
            .ok_or_else(|| anyhow::anyhow!("Missing completed"))?;

        if self.store.update(&id, completed).await {
            info!(name: "todo.updated", id = %id, completed);
            broadcast_list(self.store.as_ref(), &self.feed).await;
            Ok(ToolOutput::text(format!(
                "Updated todo {id} (completed: {completed})"
            )))
        } else {
            Ok(ToolOutput::error(format!("Failed to update todo {id}")))
        }
    }
}
