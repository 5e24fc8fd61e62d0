//! Bearer credential sources.
//!
//! Credentials expire, so callers ask for one on every request instead of
//! holding on to a token.

use async_trait::async_trait;

use crate::ChatError;

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a currently valid bearer token, or
    /// [`ChatError::AuthenticationMissing`] if none can be obtained.
    async fn bearer_token(&self) -> Result<String, ChatError>;
}

/// A fixed token, mostly useful for tests and scripts.
#[derive(Clone)]
pub struct StaticCredential {
    token: String,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredential")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn bearer_token(&self) -> Result<String, ChatError> {
        non_empty(self.token.clone())
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

#[async_trait]
impl CredentialProvider for EnvCredential {
    async fn bearer_token(&self) -> Result<String, ChatError> {
        let token = std::env::var(&self.var).map_err(|_| ChatError::AuthenticationMissing)?;
        non_empty(token)
    }
}

fn non_empty(token: String) -> Result<String, ChatError> {
    let token = token.trim().to_string();
    if token.is_empty() {
        Err(ChatError::AuthenticationMissing)
    } else {
        Ok(token)
    }
}
