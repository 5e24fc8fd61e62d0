use serde::{Deserialize, Serialize};

/// Exchange request shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Prompts longer than this many characters are flagged `isComplex`.
    pub complex_prompt_chars: u32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            complex_prompt_chars: 280,
        }
    }
}

/// Session directory presentation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Truncation length for titles derived from the first user message.
    pub title_max_chars: u32,
    /// Truncation length for previews derived from the last assistant reply.
    pub preview_max_chars: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            title_max_chars: 50,
            preview_max_chars: 100,
        }
    }
}
