//! Conversation event feed.
//!
//! Lets a view follow a streaming reply without polling the store.

use haven_common::{MessageId, SessionRef};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::message::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ConversationEvent {
    MessageAppended { id: MessageId, role: Role },
    Delta { id: MessageId, text: String },
    MessageCompleted { id: MessageId },
    MessageFailed { id: MessageId },
    SessionAdopted(SessionRef),
    SessionLoaded(SessionRef),
    SessionReset,
    ErrorRaised(String),
    ErrorCleared,
}

pub struct EventBus {
    sender: broadcast::Sender<ConversationEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.sender.subscribe()
    }

    /// Publish to current subscribers. Returns how many received it.
    pub fn publish(&self, event: ConversationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
