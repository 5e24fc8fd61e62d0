use serde::{Deserialize, Serialize};

/// Where the bearer credential comes from.
///
/// Only the name of the variable lives in config; the token itself is read
/// fresh from the environment for every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: "HAVEN_TOKEN".into(),
        }
    }
}
