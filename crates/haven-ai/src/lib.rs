//! Conversation engine for Haven.
//!
//! Talks to the remote assistant service over a streamed HTTP response and
//! keeps the in-memory transcript tied to a server-assigned session:
//! - Line reconstruction over arbitrary chunk boundaries (`streaming`)
//! - Strict decoding of `data:` frames (`frame`)
//! - The per-message Pending → Streaming → Complete reducer (`message`)
//! - The session state store and its owner, `Conversation`
//! - Listing, loading and deleting past sessions (`directory`, `loader`)

pub mod client;
pub mod conversation;
pub mod credentials;
pub mod directory;
pub mod events;
pub mod frame;
pub mod loader;
pub mod message;
pub mod store;
pub mod streaming;

pub use client::HavenClient;
pub use conversation::{Conversation, ConversationOptions, SendOptions, SendOutcome};
pub use credentials::{CredentialProvider, EnvCredential, StaticCredential};
pub use directory::{SessionDirectory, SessionSummary, UNTITLED_CONVERSATION};
pub use events::{ConversationEvent, EventBus};
pub use frame::Frame;
pub use message::{MediaItem, Message, MessageStatus, Role};
pub use store::{SessionPhase, SessionStore, StoreSnapshot};

pub use haven_common::{MessageId, SessionRef};

/// Errors raised by the conversation engine.
///
/// Cloneable so the most recent one can sit in the store's error slot while
/// also being returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Not signed in: no credential available")]
    AuthenticationMissing,
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Stream stalled: no data for {0} ms")]
    StallTimeout(u64),
    #[error("Stream ended before the reply completed")]
    StreamIncomplete,
    #[error("Conversation is busy with another request")]
    Busy,
    #[error("Request cancelled")]
    Cancelled,
    #[error("Failed to load session {session_ref}: {reason}")]
    SessionLoad { session_ref: String, reason: String },
    #[error("Failed to delete session {session_ref}: {reason}")]
    SessionDelete { session_ref: String, reason: String },
}

impl From<ChatError> for haven_common::HavenError {
    fn from(err: ChatError) -> Self {
        haven_common::HavenError::Chat(err.to_string())
    }
}
