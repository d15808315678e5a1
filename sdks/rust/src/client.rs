//! HTTP client for interacting with the server.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{Error, Result},
    types::*,
};

/// Decoded events buffered between the reader task and the consumer.
const EVENT_BUFFER: usize = 64;

/// HTTP client for the API.
///
/// # Example
///
/// ```rust,no_run
/// use todo_mcp_sdk::Client;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("http://localhost:3001")?;
///
/// let _subscription = client
///     .subscribe_todos(|todos| println!("{} todos", todos.len()))
///     .await?;
///
/// let result = client.tools().add_todo("Buy milk").await?;
/// println!("{}", result.text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl Client {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:3001")
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url,
            http,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the tools API.
    pub fn tools(&self) -> ToolsApi<'_> {
        ToolsApi { client: self }
    }

    pub async fn health(&self) -> Result<Health> {
        let response = self.http.get(self.url("/health")).send().await?;
        Self::handle_response(response).await
    }

    /// Send one JSON-RPC request over `POST /mcp` and return its result.
    pub async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let response = self
            .http
            .post(self.url("/mcp"))
            .json(&request)
            .send()
            .await?;
        let envelope: RpcResponse = Self::handle_response(response).await?;

        match (envelope.result, envelope.error) {
            (_, Some(error)) => Err(Error::Rpc {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event stream
    // ─────────────────────────────────────────────────────────────────────────

    /// Open `GET /sse` and decode its events.
    ///
    /// Resolves once the server has accepted the stream, so anything
    /// published afterwards is observed.
    pub async fn events(&self) -> Result<EventStream> {
        let response = self
            .http
            .get(self.url("/sse"))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let reader = tokio::spawn(async move {
            let mut frames = response.bytes_stream().eventsource();

            while let Some(frame) = frames.next().await {
                let event = match frame {
                    Ok(frame) => serde_json::from_str::<ServerEvent>(&frame.data).map_err(|e| {
                        warn!(event = %frame.event, error = %e, "undecodable event");
                        Error::Json(e)
                    }),
                    Err(e) => {
                        let _ = tx.send(Err(Error::Stream(e.to_string()))).await;
                        return;
                    }
                };
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            debug!("event stream closed by server");
        });

        Ok(EventStream {
            inner: ReceiverStream::new(rx),
            reader,
        })
    }

    /// Call `on_data` with the payload of every `message` event on
    /// `channel`, in arrival order, until the returned handle is dropped.
    pub async fn subscribe<F>(&self, channel: impl Into<String>, mut on_data: F) -> Result<Subscription>
    where
        F: FnMut(Value) + Send + 'static,
    {
        let channel = channel.into();
        let mut events = self.events().await?;

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    Ok(ServerEvent::Message { channel: c, data }) if c == channel => on_data(data),
                    Ok(_) => {}
                    Err(Error::Json(_)) => {}
                    Err(e) => {
                        warn!(channel = %channel, error = %e, "subscription stream failed");
                        break;
                    }
                }
            }
        });

        Ok(Subscription { task })
    }

    /// [`subscribe`](Self::subscribe) to the `todos` channel with decoded
    /// snapshots. Payloads that are not a todo list are skipped.
    pub async fn subscribe_todos<F>(&self, mut on_todos: F) -> Result<Subscription>
    where
        F: FnMut(Vec<Todo>) + Send + 'static,
    {
        self.subscribe(TODOS_CHANNEL, move |data| {
            match serde_json::from_value::<Vec<Todo>>(data) {
                Ok(todos) => on_todos(todos),
                Err(e) => warn!(error = %e, "unexpected todos payload"),
            }
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

// =============================================================================
// Event stream handles
// =============================================================================

/// Decoded server events. Dropping it closes the connection.
#[derive(Debug)]
pub struct EventStream {
    inner: ReceiverStream<Result<ServerEvent>>,
    reader: JoinHandle<()>,
}

impl Stream for EventStream {
    type Item = Result<ServerEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Running channel subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stop delivering messages.
    pub fn close(&self) {
        self.task.abort();
    }

    /// `true` once the stream has ended (server closed it or it was closed).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// Tools API
// =============================================================================

/// Tools API client.
#[derive(Debug)]
pub struct ToolsApi<'a> {
    client: &'a Client,
}

impl ToolsApi<'_> {
    /// List the server's tools.
    pub async fn list(&self) -> Result<Vec<ToolInfo>> {
        let result = self.client.rpc("tools/list", json!({})).await?;
        Ok(serde_json::from_value(result["tools"].clone())?)
    }

    /// Call a tool by name.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let result = self
            .client
            .rpc("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn add_todo(&self, title: impl Into<String>) -> Result<ToolResult> {
        self.call("addTodoItem", json!({ "title": title.into() }))
            .await
    }

    pub async fn delete_todo(&self, id: i64) -> Result<ToolResult> {
        self.call("deleteTodoItem", json!({ "id": id })).await
    }

    pub async fn update_todo(&self, id: i64, completed: bool) -> Result<ToolResult> {
        self.call("updateTodoItem", json!({ "id": id, "completed": completed }))
            .await
    }
}
