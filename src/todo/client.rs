//! HTTP client for the external todo store.
//!
//! Every call is a single attempt. Failures are logged and folded into
//! `None` / `false` so that callers never see an error from the store.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error};
use url::Url;

use super::{Todo, TodoId};

/// Remote CRUD operations on the todo list.
#[async_trait]
pub trait TodoStore: Send + Sync + std::fmt::Debug {
    /// Create a todo. `None` when the title is empty or the store call failed.
    async fn create(&self, title: &str) -> Option<Todo>;
    /// Delete a todo by id.
    async fn delete(&self, id: &TodoId) -> bool;
    /// Set the completion flag of a todo.
    async fn update(&self, id: &TodoId, completed: bool) -> bool;
    /// Fetch the full list.
    async fn list(&self) -> Option<Vec<Todo>>;
}

/// [`TodoStore`] backed by the REST API at `base_url`.
#[derive(Debug, Clone)]
pub struct HttpTodoStore {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTodoStore {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client for todo store")?;
        Self::with_client(base_url, http)
    }

    /// Create a store client with a custom reqwest client.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> anyhow::Result<Self> {
        Url::parse(base_url).with_context(|| format!("invalid todo store url: {base_url}"))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn todos_url(&self) -> String {
        format!("{}/todos", self.base_url)
    }

    fn todo_url(&self, id: &TodoId) -> String {
        format!("{}/todos/{id}", self.base_url)
    }

    /// Send a request and report whether the store accepted it.
    async fn send_ok(&self, op: &'static str, request: reqwest::RequestBuilder) -> bool {
        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                error!(
                    name: "todo_store.rejected",
                    op,
                    status = %response.status(),
                    "todo store returned an error status"
                );
                false
            }
            Err(e) => {
                error!(name: "todo_store.transport", op, error = %e, "todo store request failed");
                false
            }
        }
    }
}

#[async_trait]
impl TodoStore for HttpTodoStore {
    async fn create(&self, title: &str) -> Option<Todo> {
        if title.trim().is_empty() {
            debug!(name: "todo_store.skipped", op = "create", "empty title");
            return None;
        }

        let response = match self
            .http
            .post(self.todos_url())
            .json(&json!({ "title": title }))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!(name: "todo_store.transport", op = "create", error = %e, "todo store request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            error!(
                name: "todo_store.rejected",
                op = "create",
                status = %response.status(),
                "todo store returned an error status"
            );
            return None;
        }

        match response.json::<Todo>().await {
            Ok(todo) => Some(todo),
            Err(e) => {
                error!(name: "todo_store.decode", op = "create", error = %e, "unreadable todo store response");
                None
            }
        }
    }

    async fn delete(&self, id: &TodoId) -> bool {
        debug!(name: "todo_store.delete", id = %id);
        self.send_ok("delete", self.http.delete(self.todo_url(id)))
            .await
    }

    async fn update(&self, id: &TodoId, completed: bool) -> bool {
        let request = self
            .http
            .put(self.todo_url(id))
            .json(&json!({ "completed": completed }));
        self.send_ok("update", request).await
    }

    async fn list(&self) -> Option<Vec<Todo>> {
        let response = match self.http.get(self.todos_url()).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                error!(name: "todo_store.rejected", op = "list", status = %r.status(), "todo store returned an error status");
                return None;
            }
            Err(e) => {
                error!(name: "todo_store.transport", op = "list", error = %e, "todo store request failed");
                return None;
            }
        };

        response
            .json::<Vec<Todo>>()
            .await
            .inspect_err(|e| {
                error!(name: "todo_store.decode", op = "list", error = %e, "unreadable todo store response");
            })
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn store_for(url: &str) -> HttpTodoStore {
        HttpTodoStore::new(url, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(HttpTodoStore::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let store = store_for("http://localhost:8080/");
        assert_eq!(store.todos_url(), "http://localhost:8080/todos");
        assert_eq!(
            store.todo_url(&TodoId::Int(3)),
            "http://localhost:8080/todos/3"
        );
    }

    #[tokio::test]
    async fn test_create_posts_title() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/todos")
            .match_body(Matcher::Json(json!({"title": "Buy milk"})))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 1, "title": "Buy milk", "completed": false}"#)
            .create_async()
            .await;

        let todo = store_for(&server.url()).create("Buy milk").await.unwrap();
        assert_eq!(todo.id, TodoId::Int(1));
        assert_eq!(todo.title, "Buy milk");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_with_empty_title_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/todos")
            .expect(0)
            .create_async()
            .await;

        assert!(store_for(&server.url()).create("   ").await.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_rejected_returns_none() {
        let mut server = Server::new_async().await;
        let _m1 = server
            .mock("POST", "/todos")
            .with_status(500)
            .create_async()
            .await;

        assert!(store_for(&server.url()).create("x").await.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_is_swallowed() {
        // Nothing listens on the discard port.
        let store = store_for("http://127.0.0.1:9");
        assert!(store.create("x").await.is_none());
        assert!(!store.delete(&TodoId::Int(1)).await);
        assert!(!store.update(&TodoId::Int(1), true).await);
        assert!(store.list().await.is_none());
    }

    #[tokio::test]
    async fn test_delete_and_update_report_status() {
        let mut server = Server::new_async().await;
        let _m2 = server
            .mock("DELETE", "/todos/5")
            .with_status(204)
            .create_async()
            .await;
        let _m3 = server
            .mock("PUT", "/todos/6")
            .match_body(Matcher::Json(json!({"completed": true})))
            .with_status(404)
            .create_async()
            .await;

        let store = store_for(&server.url());
        assert!(store.delete(&TodoId::Int(5)).await);
        assert!(!store.update(&TodoId::Int(6), true).await);
    }

    #[tokio::test]
    async fn test_list_decodes_array() {
        let mut server = Server::new_async().await;
        let _m4 = server
            .mock("GET", "/todos")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "title": "a", "completed": true}, {"id": "2", "title": "b", "completed": false}]"#)
            .create_async()
            .await;

        let todos = store_for(&server.url()).list().await.unwrap();
        assert_eq!(todos.len(), 2);
        assert!(todos[0].completed);
        assert_eq!(todos[1].id, TodoId::Text("2".into()));
    }
}
