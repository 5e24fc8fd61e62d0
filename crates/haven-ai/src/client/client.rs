//! Client struct, URL building, and shared response handling.

use std::time::Duration;

use haven_common::SessionRef;
use haven_config::ApiConfig;

use crate::ChatError;

/// Longest slice of an error body kept in `ChatError::Status`.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 200;

/// Assistant service client.
#[derive(Debug, Clone)]
pub struct HavenClient {
    pub(crate) api: ApiConfig,
    pub(crate) http: reqwest::Client,
}

impl HavenClient {
    /// Build a client. No overall request timeout is set because exchange
    /// bodies stream for as long as the reply takes; stalls are bounded by
    /// the stream reader instead.
    pub fn new(api: ApiConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .build()
            .map_err(|e| ChatError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { api, http })
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    /// Per-chunk stall timeout configured for exchange streams.
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.api.stall_timeout_secs)
    }

    pub(crate) fn chat_url(&self) -> String {
        self.api.chat_url()
    }

    pub(crate) fn sessions_url(&self) -> String {
        self.api.sessions_url()
    }

    /// URL of one stored session; the reference is percent-encoded as a
    /// single path segment.
    pub(crate) fn session_url(&self, session_ref: &SessionRef) -> Result<reqwest::Url, ChatError> {
        let mut url = reqwest::Url::parse(&self.sessions_url())
            .map_err(|e| ChatError::Network(format!("invalid sessions URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ChatError::Network("sessions URL cannot take a path".into()))?
            .pop_if_empty()
            .push(session_ref.as_str());
        Ok(url)
    }

    /// Turn a non-success response into `ChatError::Status`.
    pub(crate) async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(ChatError::Status {
            status: status.as_u16(),
            body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }
}
