//! Todo MCP server
//!
//! Exposes a remote todo list as Model Context Protocol tools and pushes
//! list snapshots to streaming subscribers.
//!
//! # Architecture
//!
//! - **Server**: Axum router with JSON-RPC over HTTP and an SSE event stream
//! - **Dispatcher**: JSON-RPC method routing onto a registry of validated tools
//! - **Notifier**: per-connection keep-alive and lifetime management
//! - **Todo store**: HTTP client for the backing REST service
//!
//! # Modules
//!
//! - [`mcp`]: envelopes, parameter schemas, tool registry and dispatcher
//! - [`notifier`]: subscriber connections, change feed and session routing
//! - [`todo`]: todo model and remote store client
//! - [`tools`]: the todo tools
//! - [`server`]: router and startup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod mcp;
pub mod notifier;
pub mod server;
pub mod todo;
pub mod tools;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::mcp::Dispatcher;
use crate::notifier::Notifier;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// JSON-RPC method router.
    pub dispatcher: Arc<Dispatcher>,
    /// Streaming connections and their sessions.
    pub notifier: Arc<Notifier>,
    pub config: Arc<AppConfig>,
}
