//! Chat messages and the per-message reducer.
//!
//! An assistant message starts as an empty `Pending` placeholder, becomes
//! `Streaming` on its first delta, and ends `Complete` (terminal frame) or
//! `Failed` (stream ended without one). Final messages never change again.

use chrono::{DateTime, Utc};
use haven_common::{MessageId, SessionRef};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Streaming,
    Complete,
    Failed,
}

impl MessageStatus {
    /// Pending and Streaming messages are still being written by a stream.
    pub fn is_active(self) -> bool {
        matches!(self, MessageStatus::Pending | MessageStatus::Streaming)
    }

    pub fn is_final(self) -> bool {
        !self.is_active()
    }
}

/// A media attachment delivered with the terminal frame of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub thumbnail: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize an optional media list item by item. Malformed items are
/// dropped, and a value that is not a list at all reads as absent, so bad
/// media never rejects the payload carrying it.
pub(crate) fn lenient_media<'de, D>(deserializer: D) -> Result<Option<Vec<MediaItem>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let items = match raw {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Array(items)) => items,
        Some(other) => {
            warn!(value = %other, "ignoring media that is not a list");
            return Ok(None);
        }
    };

    let media = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<MediaItem>(item) {
            Ok(media) => Some(media),
            Err(e) => {
                warn!(error = %e, "dropping malformed media item");
                None
            }
        })
        .collect();
    Ok(Some(media))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub media: Vec<MediaItem>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

/// What applying one frame did to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    /// Delta text was appended.
    Appended,
    /// The message reached `Complete`; carries the frame's session reference.
    Completed { session_ref: Option<SessionRef> },
    /// The message was already final (or is not an assistant message).
    Ignored,
}

impl Message {
    /// A user message. User messages are complete the moment they exist.
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            media: Vec::new(),
            status: MessageStatus::Complete,
            created_at: Utc::now(),
        }
    }

    /// An empty assistant placeholder awaiting its first frame.
    pub fn placeholder(id: MessageId) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            media: Vec::new(),
            status: MessageStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// A message restored from stored history.
    pub fn restored(id: MessageId, role: Role, content: String, media: Vec<MediaItem>) -> Self {
        Self {
            id,
            role,
            content,
            media,
            status: MessageStatus::Complete,
            created_at: Utc::now(),
        }
    }

    /// Advance the message with one decoded frame.
    pub fn apply(&mut self, frame: Frame) -> Reduction {
        if self.role != Role::Assistant || self.status.is_final() {
            debug!(id = %self.id, status = ?self.status, "frame for final message ignored");
            return Reduction::Ignored;
        }

        match frame {
            Frame::Delta { text } => {
                self.status = MessageStatus::Streaming;
                self.content.push_str(&text);
                Reduction::Appended
            }
            Frame::Terminal { session_ref, media } => {
                self.media = media.unwrap_or_default();
                self.status = MessageStatus::Complete;
                Reduction::Completed { session_ref }
            }
        }
    }

    /// Mark an unfinished message as failed, keeping any partial content.
    /// Returns `false` if the message was already final.
    pub fn fail(&mut self) -> bool {
        if self.status.is_final() {
            return false;
        }
        self.status = MessageStatus::Failed;
        true
    }
}
