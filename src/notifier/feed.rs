use serde_json::json;
use tokio::sync::broadcast;
use tracing::debug;

use super::event::{ChannelMessage, TODOS_CHANNEL};
use crate::todo::TodoStore;

/// Fan-out of channel messages to every open connection.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChannelMessage>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a message; returns how many connections received it.
    pub fn publish(&self, message: ChannelMessage) -> usize {
        let receivers = self.tx.send(message).unwrap_or(0);
        debug!(name: "notifier.feed.published", receivers);
        receivers
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelMessage> {
        self.tx.subscribe()
    }

    /// Fetch the current list from the store and publish it on the
    /// `todos` channel. Nothing is published if the fetch fails.
    pub async fn publish_todos(&self, store: &dyn TodoStore) -> Option<usize> {
        let todos = store.list().await?;
        Some(self.publish(ChannelMessage::new(TODOS_CHANNEL, json!(todos))))
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}
