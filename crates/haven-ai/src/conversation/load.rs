//! Loading a stored session into the conversation.

use haven_common::SessionRef;
use tracing::info;

use crate::events::ConversationEvent;
use crate::loader::fetch_transcript;
use crate::ChatError;

use super::manager::Conversation;

impl Conversation {
    /// Replace the transcript with stored session `session_ref`.
    ///
    /// The session is fetched in full before the store is touched; on any
    /// failure the current transcript stays exactly as it was and the error
    /// is returned.
    pub async fn load_session(&self, session_ref: &SessionRef) -> Result<(), ChatError> {
        let op = self.begin_operation()?;
        let generation = {
            let mut store = self.lock_store();
            store.set_loading(true);
            store.generation()
        };

        let fetched = tokio::select! {
            biased;
            _ = op.cancel.cancelled() => Err(ChatError::Cancelled),
            res = fetch_transcript(&self.client, self.credentials.as_ref(), session_ref) => res,
        };
        let loaded = match fetched {
            Ok(loaded) => loaded,
            Err(e) => {
                self.with_store_if(generation, |s| s.set_loading(false));
                return Err(e);
            }
        };

        let count = loaded.messages.len();
        let session_ref = loaded.session_ref;
        let applied = self.with_store_if(generation, |s| {
            s.replace(session_ref.clone(), loaded.messages)
        });
        if applied.is_none() {
            info!(%session_ref, "session reset during load; result dropped");
            return Err(ChatError::Cancelled);
        }

        info!(%session_ref, messages = count, "session loaded");
        self.events
            .publish(ConversationEvent::SessionLoaded(session_ref));
        Ok(())
    }
}
