//! Streaming notifier.
//!
//! Subscribers hold a long-lived event stream. Every connection receives:
//!
//! 1. one `server_info` event when it opens,
//! 2. a `ping` every keep-alive interval,
//! 3. `message` events for everything published on the [`ChangeFeed`],
//! 4. `response` events for requests posted to its session endpoint,
//!
//! and is closed once its lifetime has elapsed. Delivery is best-effort:
//! events for a subscriber that stopped reading are dropped, never queued
//! without bound.

mod connection;
mod event;
mod feed;
mod hub;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

pub use connection::{ConnectionHandle, ConnectionState, NotifierConfig, Subscription};
pub use event::{ChannelMessage, NotifierEvent, TODOS_CHANNEL};
pub use feed::ChangeFeed;
pub use hub::SessionHub;

use crate::mcp::types::{PROTOCOL_VERSION, ServerInfo};
use connection::Connection;

/// Path that accepts requests for a streaming session (`?sessionId=`).
pub const MESSAGE_PATH: &str = "/messages";

/// Dispatcher responses queued per session before new ones are refused.
const RESPONSE_BUFFER: usize = 16;

#[derive(Debug, Clone)]
pub struct Notifier {
    config: NotifierConfig,
    server: ServerInfo,
    feed: ChangeFeed,
    hub: SessionHub,
}

impl Notifier {
    pub fn new(config: NotifierConfig, server: ServerInfo, feed: ChangeFeed) -> Self {
        Self {
            config,
            server,
            feed,
            hub: SessionHub::new(),
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn sessions(&self) -> &SessionHub {
        &self.hub
    }

    /// Open a connection and start its lifecycle task.
    pub fn open(&self) -> Subscription {
        let id = Uuid::new_v4();
        let (responses_tx, responses_rx) = tokio::sync::mpsc::channel(RESPONSE_BUFFER);
        self.hub.insert(id, responses_tx);

        let (connection, subscription) =
            Connection::pair(id, self.config, self.feed.subscribe(), responses_rx);

        let first = NotifierEvent::ServerInfo {
            name: self.server.name.clone(),
            version: self.server.version.clone(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({ "tools": {} }),
            session_id: id,
            endpoint: format!("{MESSAGE_PATH}?sessionId={id}"),
        };

        let hub = self.hub.clone();
        tokio::spawn(async move {
            connection.run(first).await;
            hub.remove(&id);
        });

        info!(name: "notifier.connection.opened", connection = %id, "connection opened");
        subscription
    }
}
