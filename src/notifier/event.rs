use axum::response::sse::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::mcp::types::JsonRpcResponse;

/// Channel carrying full todo list snapshots.
pub const TODOS_CHANNEL: &str = "todos";

/// Payload published to subscribers of a named channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    pub data: Value,
}

impl ChannelMessage {
    pub fn new(channel: impl Into<String>, data: Value) -> Self {
        Self {
            channel: channel.into(),
            data,
        }
    }
}

/// Events pushed down a subscriber connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierEvent {
    /// First event on every connection.
    ServerInfo {
        name: String,
        version: String,
        protocol_version: String,
        capabilities: Value,
        session_id: Uuid,
        /// Where to POST requests whose responses should arrive on this stream.
        endpoint: String,
    },
    /// Keep-alive.
    Ping { timestamp: DateTime<Utc> },
    /// Channel message from the change feed.
    Message(ChannelMessage),
    /// Dispatcher response routed to this session.
    Response(JsonRpcResponse),
}

impl NotifierEvent {
    pub fn ping() -> Self {
        Self::Ping {
            timestamp: Utc::now(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ServerInfo { .. } => "server_info",
            Self::Ping { .. } => "ping",
            Self::Message(_) => "message",
            Self::Response(_) => "response",
        }
    }

    /// Encode as one SSE frame: event name plus a single JSON `data:` line.
    pub fn to_sse(&self) -> Event {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        Event::default().event(self.name()).data(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_event_is_flat() {
        let event = NotifierEvent::Message(ChannelMessage::new(TODOS_CHANNEL, json!([1])));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"type": "message", "channel": "todos", "data": [1]}));
        assert_eq!(event.name(), "message");
    }

    #[test]
    fn test_ping_round_trips() {
        let event = NotifierEvent::ping();
        let text = serde_json::to_string(&event).unwrap();
        assert!(text.contains(r#""type":"ping""#));
        let back: NotifierEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }
}
