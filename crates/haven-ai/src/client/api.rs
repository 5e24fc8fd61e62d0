//! Endpoint calls: the streamed exchange and the session collection.

use haven_common::SessionRef;
use tracing::debug;

use super::client::HavenClient;
use super::wire::{
    ExchangeRequest, SessionFetchResponse, SessionListResponse, StoredSession,
    StoredSessionRecord,
};
use crate::ChatError;

impl HavenClient {
    /// POST the exchange request and return the open response once the
    /// status is known to be a success. The body is left unread for the
    /// stream reader.
    pub async fn open_exchange(
        &self,
        request: &ExchangeRequest,
        token: &str,
    ) -> Result<reqwest::Response, ChatError> {
        debug!(
            history = request.history.len(),
            is_complex = request.is_complex,
            session_ref = ?request.session_ref,
            "exchange request"
        );

        let response = self
            .http
            .post(self.chat_url())
            .bearer_auth(token)
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        Self::check_status(response).await
    }

    /// GET the caller's stored sessions.
    pub async fn list_sessions(&self, token: &str) -> Result<Vec<StoredSessionRecord>, ChatError> {
        let response = self
            .http
            .get(self.sessions_url())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let body: SessionListResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        debug!(count = body.sessions.len(), "session list fetched");
        Ok(body.sessions)
    }

    /// GET one stored session with its full history.
    pub async fn fetch_session(
        &self,
        session_ref: &SessionRef,
        token: &str,
    ) -> Result<StoredSession, ChatError> {
        let response = self
            .http
            .get(self.session_url(session_ref)?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let body: SessionFetchResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        debug!(
            %session_ref,
            entries = body.session.history.len(),
            "session fetched"
        );
        Ok(body.session)
    }

    /// DELETE one stored session. Any 2xx status is success.
    pub async fn delete_session(
        &self,
        session_ref: &SessionRef,
        token: &str,
    ) -> Result<(), ChatError> {
        let response = self
            .http
            .delete(self.session_url(session_ref)?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        debug!(%session_ref, "session deleted");
        Ok(())
    }
}
