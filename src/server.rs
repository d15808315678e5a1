use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::config::AppConfig;
use crate::mcp::Dispatcher;
use crate::mcp::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerInfo};
use crate::notifier::{ChangeFeed, MESSAGE_PATH, Notifier};
use crate::todo::{HttpTodoStore, TodoStore};
use crate::tools::todo_registry;

/// Wire the dispatcher and notifier around a todo store.
pub fn build_state(config: Arc<AppConfig>, store: Arc<dyn TodoStore>) -> AppState {
    let server = ServerInfo::default();
    let feed = ChangeFeed::new(config.notifier.buffer_size);

    let registry = todo_registry(store, feed.clone());
    for name in registry.names() {
        info!(name: "mcp.tool.registered", tool = %name, "tool registered");
    }

    let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), server.clone()));
    let notifier = Arc::new(Notifier::new(config.notifier_config(), server, feed));

    AppState {
        dispatcher,
        notifier,
        config,
    }
}

pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.config.server.request_timeout();

    let rpc = Router::new()
        .route("/mcp", post(mcp_handler))
        .route(MESSAGE_PATH, post(message_handler))
        .layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            bounded(request_timeout, req, next)
        }));

    Router::new()
        .merge(rpc)
        .route("/sse", get(sse_handler))
        .route("/health", get(health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let store = HttpTodoStore::new(&config.store.base_url, config.store.timeout())?;
    info!(
        name: "todo_store.configured",
        base_url = %store.base_url(),
        "todo store configured"
    );

    let app = build_router(build_state(Arc::clone(&config), Arc::new(store)));

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(name: "server.stopping", "shutdown signal received");
    }
}

/// Caps one JSON-RPC exchange. The request body is already consumed by the
/// time the limit hits, so the failure carries no id.
async fn bounded(limit: Duration, req: Request, next: Next) -> Response {
    if let Ok(res) = tokio::time::timeout(limit, next.run(req)).await {
        return res;
    }
    warn!(
        name: "rpc.timed_out",
        limit_secs = limit.as_secs(),
        "request exceeded its time limit"
    );
    JsonRpcResponse::failure(None, JsonRpcError::internal("request timed out")).into_response()
}

/// Decode a request body. The error side is the response to send back.
fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| JsonRpcResponse::failure(None, JsonRpcError::parse_error(e)))?;

    let id = value.get("id").cloned();
    let request: JsonRpcRequest = serde_json::from_value(value)
        .map_err(|e| JsonRpcResponse::failure(id.clone(), JsonRpcError::invalid_request(e)))?;

    if request.jsonrpc != "2.0" {
        return Err(JsonRpcResponse::failure(
            id,
            JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
        ));
    }
    Ok(request)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// JSON-RPC over plain HTTP. Notifications are acknowledged with 202.
async fn mcp_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(response) => return response.into_response(),
    };

    let notification = request.is_notification();
    let response = state.dispatcher.dispatch(request).await;
    if notification {
        StatusCode::ACCEPTED.into_response()
    } else {
        response.into_response()
    }
}

async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.notifier.open();
    Sse::new(subscription.map(|event| Ok(event.to_sse())))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Uuid,
}

/// Request whose response is delivered on the session's event stream.
async fn message_handler(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let sessions = state.notifier.sessions();
    if !sessions.contains(&query.session_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown session", "sessionId": query.session_id })),
        )
            .into_response();
    }

    let response = match parse_request(&body) {
        Ok(request) => {
            let notification = request.is_notification();
            let response = state.dispatcher.dispatch(request).await;
            if notification {
                return StatusCode::ACCEPTED.into_response();
            }
            response
        }
        Err(response) => response,
    };

    if !sessions.deliver(&query.session_id, response) {
        warn!(
            name: "notifier.response.undelivered",
            session = %query.session_id,
            "session closed or not reading"
        );
    }
    StatusCode::ACCEPTED.into_response()
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let server = state.dispatcher.server_info();
    Json(json!({
        "status": "ok",
        "name": server.name,
        "version": server.version,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::types::{INTERNAL_ERROR, INVALID_REQUEST, PARSE_ERROR};
    use crate::todo::{Todo, TodoId};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};
    use tower::ServiceExt;

    /// Store whose calls never finish within a test.
    #[derive(Debug)]
    struct StalledStore;

    #[async_trait]
    impl TodoStore for StalledStore {
        async fn create(&self, _title: &str) -> Option<Todo> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            None
        }

        async fn delete(&self, _id: &TodoId) -> bool {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            false
        }

        async fn update(&self, _id: &TodoId, _completed: bool) -> bool {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            false
        }

        async fn list(&self) -> Option<Vec<Todo>> {
            None
        }
    }

    fn router() -> (Router, AppState) {
        let config = Arc::new(AppConfig::load_from_args(["todo-mcp"]).unwrap());
        // Nothing listens on the discard port.
        let store = HttpTodoStore::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let state = build_state(config, Arc::new(store));
        (build_router(state.clone()), state)
    }

    #[tokio::test]
    async fn test_sse_opens_a_session() {
        let (app, state) = router();
        let response = app
            .oneshot(HttpRequest::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(state.notifier.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_health_oneshot() {
        let (app, _) = router();
        let response = app
            .oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_request_gets_an_envelope() {
        let mut config = AppConfig::load_from_args(["todo-mcp"]).unwrap();
        config.server.request_timeout_secs = 1;
        let app = build_router(build_state(Arc::new(config), Arc::new(StalledStore)));

        let body = json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": { "name": "addTodoItem", "arguments": { "title": "slow" } },
        });
        let response = app
            .oneshot(
                HttpRequest::post("/mcp")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let envelope: JsonRpcResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope.id, None);
        let error = envelope.error.unwrap();
        assert_eq!(error.code, INTERNAL_ERROR);
        assert!(error.message.contains("timed out"));
    }

    #[test]
    fn test_parse_request_error_codes() {
        let err = parse_request(b"{not json").unwrap_err();
        assert_eq!(err.error.unwrap().code, PARSE_ERROR);
        assert_eq!(err.id, None);

        let err = parse_request(br#"{"jsonrpc":"2.0","id":4}"#).unwrap_err();
        assert_eq!(err.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(err.id, Some(json!(4)));

        let err = parse_request(br#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).unwrap_err();
        assert_eq!(err.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn test_parse_request_notification() {
        let req = parse_request(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .unwrap();
        assert!(req.is_notification());
    }
}
