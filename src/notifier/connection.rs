//! Per-connection lifecycle: `Open -> Closing -> Closed`.
//!
//! Each connection runs in its own task, which owns the keep-alive interval
//! and the lifetime deadline. Both timers are dropped with the task, so
//! nothing outlives the connection.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::event::{ChannelMessage, NotifierEvent};
use crate::mcp::types::JsonRpcResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closing,
    Closed,
}

/// Timer settings for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierConfig {
    pub keepalive_interval: Duration,
    pub lifetime: Duration,
    /// Outbound events buffered per connection before new ones are dropped.
    pub buffer_size: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_secs(30),
            lifetime: Duration::from_secs(300),
            buffer_size: 64,
        }
    }
}

/// Why the connection loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    Cancelled,
    Expired,
    PeerGone,
    FeedClosed,
}

/// Cloneable control handle for one connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    cancel: CancellationToken,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Request close. Safe to call any number of times, in any state.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait until the connection task has finished.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        // The sender only disappears after publishing `Closed`.
        let _ = state.wait_for(|s| *s == ConnectionState::Closed).await;
    }
}

/// Receiving end of a connection. Dropping it closes the connection.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<NotifierEvent>,
    handle: ConnectionHandle,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.handle.id
    }

    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    pub async fn recv(&mut self) -> Option<NotifierEvent> {
        self.events.recv().await
    }

    pub fn close(&self) {
        self.handle.close();
    }
}

impl Stream for Subscription {
    type Item = NotifierEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.close();
    }
}

/// Task-side state of one connection.
pub(crate) struct Connection {
    id: Uuid,
    config: NotifierConfig,
    outbound: mpsc::Sender<NotifierEvent>,
    changes: broadcast::Receiver<ChannelMessage>,
    responses: mpsc::Receiver<JsonRpcResponse>,
    cancel: CancellationToken,
    state: watch::Sender<ConnectionState>,
}

impl Connection {
    /// Build the task side and the subscriber side of a new connection.
    pub(crate) fn pair(
        id: Uuid,
        config: NotifierConfig,
        changes: broadcast::Receiver<ChannelMessage>,
        responses: mpsc::Receiver<JsonRpcResponse>,
    ) -> (Self, Subscription) {
        let (outbound, events) = mpsc::channel(config.buffer_size.max(1));
        let (state, state_rx) = watch::channel(ConnectionState::Open);
        let cancel = CancellationToken::new();

        let connection = Self {
            id,
            config,
            outbound,
            changes,
            responses,
            cancel: cancel.clone(),
            state,
        };
        let subscription = Subscription {
            events,
            handle: ConnectionHandle {
                id,
                cancel,
                state: state_rx,
            },
        };
        (connection, subscription)
    }

    /// Best-effort send. `false` only when the subscriber is gone; a full
    /// buffer drops the event instead of waiting.
    fn emit(&self, event: NotifierEvent) -> bool {
        match self.outbound.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                debug!(
                    name: "notifier.event.dropped",
                    connection = %self.id,
                    event = event.name(),
                    "subscriber buffer full"
                );
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub(crate) async fn run(mut self, first: NotifierEvent) {
        let opened = Instant::now();
        let period = self.config.keepalive_interval;
        let mut keepalive = interval_at(opened + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let expiry = sleep_until(opened + self.config.lifetime);
        tokio::pin!(expiry);

        let reason = if self.emit(first) {
            loop {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break CloseReason::Cancelled,
                    () = &mut expiry => break CloseReason::Expired,
                    _ = keepalive.tick() => {
                        if !self.emit(NotifierEvent::ping()) {
                            break CloseReason::PeerGone;
                        }
                    }
                    Some(response) = self.responses.recv() => {
                        if !self.emit(NotifierEvent::Response(response)) {
                            break CloseReason::PeerGone;
                        }
                    }
                    change = self.changes.recv() => match change {
                        Ok(message) => {
                            if !self.emit(NotifierEvent::Message(message)) {
                                break CloseReason::PeerGone;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(name: "notifier.feed.lagged", connection = %self.id, skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break CloseReason::FeedClosed,
                    },
                }
            }
        } else {
            CloseReason::PeerGone
        };

        self.state.send_replace(ConnectionState::Closing);
        self.responses.close();
        info!(
            name: "notifier.connection.closed",
            connection = %self.id,
            reason = ?reason,
            open_for_ms = u64::try_from(opened.elapsed().as_millis()).unwrap_or(u64::MAX),
            "connection closed"
        );
        self.state.send_replace(ConnectionState::Closed);
    }
}
