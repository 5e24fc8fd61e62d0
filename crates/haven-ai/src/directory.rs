//! The session directory: past sessions with derived titles and previews.

use chrono::{DateTime, Utc};
use haven_common::SessionRef;
use haven_config::DirectoryConfig;
use tracing::{info, warn};

use crate::client::{HavenClient, StoredSessionRecord};
use crate::credentials::CredentialProvider;
use crate::message::Role;
use crate::ChatError;

/// Title used when nothing better can be derived.
pub const UNTITLED_CONVERSATION: &str = "Untitled Conversation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_ref: SessionRef,
    pub title: String,
    pub preview: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionSummary {
    pub fn from_record(record: &StoredSessionRecord, limits: &DirectoryConfig) -> Self {
        Self {
            session_ref: record.session_ref.clone(),
            title: derive_title(record, limits.title_max_chars as usize),
            preview: derive_preview(record, limits.preview_max_chars as usize),
            created_at: record.created_at.as_ref().and_then(|t| t.to_datetime()),
            updated_at: record.updated_at.as_ref().and_then(|t| t.to_datetime()),
        }
    }
}

/// Title precedence: stored title, stored prompt, first user message
/// (truncated), then [`UNTITLED_CONVERSATION`].
pub fn derive_title(record: &StoredSessionRecord, max_chars: usize) -> String {
    present(&record.title)
        .or_else(|| present(&record.prompt))
        .map(str::to_string)
        .or_else(|| history_text(record, Role::User, false).map(|t| truncate_chars(t, max_chars)))
        .unwrap_or_else(|| UNTITLED_CONVERSATION.to_string())
}

/// Preview precedence: stored last message, stored reply, last assistant
/// message (truncated), then the empty string.
pub fn derive_preview(record: &StoredSessionRecord, max_chars: usize) -> String {
    present(&record.last_message)
        .or_else(|| present(&record.reply))
        .map(str::to_string)
        .or_else(|| {
            history_text(record, Role::Assistant, true).map(|t| truncate_chars(t, max_chars))
        })
        .unwrap_or_default()
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// Text of the first (or last, when `from_end`) history entry with `role`
/// and non-empty text.
fn history_text(record: &StoredSessionRecord, role: Role, from_end: bool) -> Option<&str> {
    let history = record.history.as_deref()?;
    let mut matching = history
        .iter()
        .filter(|entry| entry.parsed_role() == Some(role))
        .filter_map(|entry| entry.first_text())
        .filter(|text| !text.trim().is_empty());
    if from_end {
        matching.last()
    } else {
        matching.next()
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Client-side list of the user's stored sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionDirectory {
    entries: Vec<SessionSummary>,
    limits: DirectoryConfig,
}

impl SessionDirectory {
    pub fn new(limits: DirectoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            limits,
        }
    }

    pub fn entries(&self) -> &[SessionSummary] {
        &self.entries
    }

    pub fn get(&self, session_ref: &SessionRef) -> Option<&SessionSummary> {
        self.entries.iter().find(|s| &s.session_ref == session_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch the session list, in server order, replacing the local
    /// entries. On failure the previous entries are kept.
    pub async fn refresh(
        &mut self,
        client: &HavenClient,
        credentials: &dyn CredentialProvider,
    ) -> Result<&[SessionSummary], ChatError> {
        let token = credentials.bearer_token().await?;
        let records = client.list_sessions(&token).await.inspect_err(|e| {
            warn!(error = %e, "session list failed");
        })?;

        self.entries = records
            .iter()
            .map(|r| SessionSummary::from_record(r, &self.limits))
            .collect();
        info!(count = self.entries.len(), "session directory refreshed");
        Ok(&self.entries)
    }

    /// Delete a stored session. The caller is expected to have confirmed
    /// with the user first.
    ///
    /// The local entry is removed only after the server confirms; on any
    /// failure the list is left untouched and the error returned.
    pub async fn delete(
        &mut self,
        client: &HavenClient,
        credentials: &dyn CredentialProvider,
        session_ref: &SessionRef,
    ) -> Result<(), ChatError> {
        let token = credentials.bearer_token().await?;
        client
            .delete_session(session_ref, &token)
            .await
            .map_err(|e| {
                warn!(%session_ref, error = %e, "session delete failed");
                ChatError::SessionDelete {
                    session_ref: session_ref.to_string(),
                    reason: e.to_string(),
                }
            })?;

        self.entries.retain(|s| &s.session_ref != session_ref);
        info!(%session_ref, "session removed from directory");
        Ok(())
    }
}
