//! Session loading: fetch a stored session and rebuild its transcript.

use haven_common::{MessageId, SessionRef};
use tracing::{debug, warn};

use crate::client::{HavenClient, HistoryEntry};
use crate::credentials::CredentialProvider;
use crate::message::Message;
use crate::ChatError;

/// A fully fetched transcript, ready to replace the store's contents.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSession {
    pub session_ref: SessionRef,
    pub messages: Vec<Message>,
}

/// Map stored history into complete messages, in order.
///
/// Content is the text of the first part; media defaults to empty. Entries
/// with an unknown role are skipped.
pub fn messages_from_history(history: &[HistoryEntry]) -> Vec<Message> {
    let mut next_id = MessageId::FIRST;
    let mut messages = Vec::with_capacity(history.len());

    for entry in history {
        let Some(role) = entry.parsed_role() else {
            debug!(role = %entry.role, "skipping history entry with unknown role");
            continue;
        };
        let content = entry.first_text().unwrap_or_default().to_string();
        let media = entry.videos.clone().unwrap_or_default();
        messages.push(Message::restored(next_id, role, content, media));
        next_id = next_id.next();
    }

    messages
}

/// Fetch session `session_ref` and map its history.
///
/// Nothing is returned until the whole session has been fetched and
/// decoded, so a failure can never yield a partial transcript.
pub async fn fetch_transcript(
    client: &HavenClient,
    credentials: &dyn CredentialProvider,
    session_ref: &SessionRef,
) -> Result<LoadedSession, ChatError> {
    let load_error = |e: ChatError| {
        warn!(%session_ref, error = %e, "session load failed");
        ChatError::SessionLoad {
            session_ref: session_ref.to_string(),
            reason: e.to_string(),
        }
    };

    let token = credentials.bearer_token().await.map_err(load_error)?;
    let stored = client
        .fetch_session(session_ref, &token)
        .await
        .map_err(load_error)?;

    if &stored.session_ref != session_ref {
        debug!(
            requested = %session_ref,
            returned = %stored.session_ref,
            "fetched session reports a different reference; keeping the requested one"
        );
    }

    Ok(LoadedSession {
        session_ref: session_ref.clone(),
        messages: messages_from_history(&stored.history),
    })
}
