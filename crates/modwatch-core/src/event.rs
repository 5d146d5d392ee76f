//! Event bus for realtime broadcast using tokio::broadcast
//!
//! Every connected realtime client subscribes; the store and the channel
//! layer publish. Delivery is fire-and-forget: lagging subscribers drop
//! events instead of blocking publishers.

use crate::store::FocusSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

/// Moderated chat message pushed to every connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub user: String,
    pub text: String,
    pub flagged: bool,
    pub categories: BTreeMap<String, bool>,
}

/// Events fanned out to realtime subscribers
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// A chat message passed through moderation
    MessageResponse(MessageResponse),
    /// Focus mode was started, stopped, or updated
    FocusStatus(FocusSnapshot),
}

/// Event bus for broadcasting channel events
///
/// Uses tokio::broadcast for multi-consumer support; each WebSocket
/// connection holds its own receiver.
pub struct EventBus {
    sender: broadcast::Sender<ChannelEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: ChannelEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.sender.subscribe()
    }

    /// Get current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
