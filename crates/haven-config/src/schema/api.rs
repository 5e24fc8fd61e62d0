use serde::{Deserialize, Serialize};

/// Remote assistant service endpoints and transport limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Path of the streamed exchange endpoint (POST).
    pub chat_path: String,
    /// Path of the session collection (GET list, GET/DELETE by id).
    pub sessions_path: String,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Longest gap between two stream chunks before the exchange is
    /// abandoned, in seconds.
    pub stall_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.haven.chat/v1".into(),
            chat_path: "/chat".into(),
            sessions_path: "/sessions".into(),
            connect_timeout_secs: 10,
            stall_timeout_secs: 45,
        }
    }
}

impl ApiConfig {
    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }

    pub fn sessions_url(&self) -> String {
        join_url(&self.base_url, &self.sessions_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
