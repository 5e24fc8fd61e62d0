//! JSON shapes exchanged with the assistant service.

use chrono::{DateTime, TimeZone, Utc};
use haven_common::SessionRef;
use serde::{Deserialize, Serialize};

use crate::message::{lenient_media, MediaItem, Message, MessageStatus, Role};

/// Wire role for user turns.
pub const ROLE_USER: &str = "user";
/// Wire role for assistant turns.
pub const ROLE_MODEL: &str = "model";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// One turn of conversation history, as sent and as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(
        default,
        deserialize_with = "lenient_media",
        skip_serializing_if = "Option::is_none"
    )]
    pub videos: Option<Vec<MediaItem>>,
}

impl HistoryEntry {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        let role = match role {
            Role::User => ROLE_USER,
            Role::Assistant => ROLE_MODEL,
        };
        Self {
            role: role.to_string(),
            parts: vec![Part { text: text.into() }],
            videos: None,
        }
    }

    /// Text of the first part, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.parts.first().map(|p| p.text.as_str())
    }

    /// Role of a stored entry. `model` and `assistant` both mean the
    /// assistant; unknown roles yield `None`.
    pub fn parsed_role(&self) -> Option<Role> {
        match self.role.as_str() {
            ROLE_USER => Some(Role::User),
            ROLE_MODEL | "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// Body of the exchange request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    pub prompt: String,
    pub is_complex: bool,
    pub history: Vec<HistoryEntry>,
    pub session_ref: Option<SessionRef>,
}

impl ExchangeRequest {
    /// Build a request from the transcript as it stood before this prompt.
    ///
    /// Only finished turns with text are replayed; failed or empty
    /// assistant placeholders are left out.
    pub fn new(
        prompt: impl Into<String>,
        is_complex: bool,
        prior: &[Message],
        session_ref: Option<SessionRef>,
    ) -> Self {
        let history = prior
            .iter()
            .filter(|m| m.status == MessageStatus::Complete && !m.content.is_empty())
            .map(|m| HistoryEntry::new(m.role, m.content.clone()))
            .collect();
        Self {
            prompt: prompt.into(),
            is_complex,
            history,
            session_ref,
        }
    }
}

/// Timestamps as the service emits them: RFC 3339 text, epoch
/// milliseconds, or a `{seconds}` / `{_seconds}` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Text(String),
    Millis(i64),
    Seconds {
        #[serde(alias = "_seconds")]
        seconds: i64,
    },
}

impl RawTimestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            RawTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            RawTimestamp::Seconds { seconds } => Utc.timestamp_opt(*seconds, 0).single(),
        }
    }
}

/// One entry of the session listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSessionRecord {
    pub session_ref: SessionRef,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(default)]
    pub created_at: Option<RawTimestamp>,
    #[serde(default)]
    pub updated_at: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionListResponse {
    #[serde(default)]
    pub sessions: Vec<StoredSessionRecord>,
}

/// A stored session with its full history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub session_ref: SessionRef,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionFetchResponse {
    pub session: StoredSession,
}
