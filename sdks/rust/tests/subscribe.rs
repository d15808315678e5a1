//! End-to-end: SDK client against a live server backed by a mock store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use mockito::{Server, ServerGuard};
use serde_json::json;
use todo_mcp::config::AppConfig;
use todo_mcp::server::{build_router, build_state};
use todo_mcp::todo::HttpTodoStore;
use todo_mcp_sdk::{Client, ServerEvent, TodoId};
use tokio::sync::mpsc;

async fn spawn_server(store_url: &str) -> SocketAddr {
    let config = Arc::new(
        AppConfig::load_from_args(["todo-mcp", "--store-url", store_url]).expect("config"),
    );
    let store = HttpTodoStore::new(&config.store.base_url, config.store.timeout()).unwrap();
    let app = build_router(build_state(config, Arc::new(store)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn setup() -> (Client, ServerGuard) {
    let store = Server::new_async().await;
    let addr = spawn_server(&store.url()).await;
    let client = Client::new(format!("http://{addr}")).unwrap();
    (client, store)
}

#[tokio::test]
async fn test_health_and_tool_listing() {
    let (client, _store) = setup().await;

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.name, "todo-mcp-server");

    let names: Vec<String> = client
        .tools()
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, ["addTodoItem", "deleteTodoItem", "updateTodoItem"]);
}

#[tokio::test]
async fn test_unknown_tool() {
    let (client, _store) = setup().await;
    let err = client
        .tools()
        .call("nonexistentTool", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.rpc_code(), Some(-32601));
}

#[tokio::test]
async fn test_first_event_is_server_info() {
    let (client, _store) = setup().await;
    let mut events = client.events().await.unwrap();

    match events.next().await {
        Some(Ok(ServerEvent::ServerInfo {
            session_id,
            endpoint,
            ..
        })) => assert!(endpoint.ends_with(&session_id)),
        other => panic!("unexpected first event: {other:?}"),
    }
}

#[tokio::test]
async fn test_subscriber_receives_snapshot_after_add() {
    let (client, mut store) = setup().await;
    let _create = store
        .mock("POST", "/todos")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":1,"title":"Buy milk","completed":false}"#)
        .create_async()
        .await;
    let _list = store
        .mock("GET", "/todos")
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":1,"title":"Buy milk","completed":false}]"#)
        .create_async()
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = client
        .subscribe_todos(move |todos| {
            let _ = tx.send(todos);
        })
        .await
        .unwrap();

    let result = client.tools().add_todo("Buy milk").await.unwrap();
    assert!(!result.is_error);
    assert!(result.text().contains("Buy milk"));

    let todos = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("snapshot in time")
        .expect("subscription alive");
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, TodoId::Int(1));
    assert_eq!(todos[0].title, "Buy milk");

    subscription.close();
}
