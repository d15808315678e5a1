use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::mcp::types::JsonRpcResponse;

/// Response senders of open streaming sessions, keyed by session id.
#[derive(Debug, Clone, Default)]
pub struct SessionHub {
    sessions: Arc<RwLock<HashMap<Uuid, mpsc::Sender<JsonRpcResponse>>>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Uuid, tx: mpsc::Sender<JsonRpcResponse>) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
    }

    pub fn remove(&self, id: &Uuid) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue a response on the session's stream. `false` if the session is
    /// unknown, closed, or not draining its buffer.
    pub fn deliver(&self, id: &Uuid, response: JsonRpcResponse) -> bool {
        let tx = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned();
        match tx {
            Some(tx) => tx.try_send(response).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_deliver_routes_by_session() {
        let hub = SessionHub::new();
        let id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(1);
        hub.insert(id, tx);

        let resp = JsonRpcResponse::success(Some(json!(1)), json!({}));
        assert!(hub.deliver(&id, resp.clone()));
        assert_eq!(rx.recv().await.unwrap(), resp);

        assert!(!hub.deliver(&Uuid::new_v4(), resp.clone()));

        hub.remove(&id);
        assert!(hub.is_empty());
        assert!(!hub.deliver(&id, resp));
    }
}
