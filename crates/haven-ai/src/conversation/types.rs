//! Conversation options, outcomes, and concurrency guards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use haven_common::{MessageId, SessionRef};
use haven_config::HavenConfig;

use crate::ChatError;

/// Tunables for a conversation.
#[derive(Debug, Clone)]
pub struct ConversationOptions {
    /// Longest wait for the response headers or the next chunk.
    pub stall_timeout: Duration,
    /// Prompts longer than this many characters are sent as complex.
    pub complex_prompt_chars: usize,
    /// Capacity of the event feed.
    pub event_capacity: usize,
}

impl Default for ConversationOptions {
    fn default() -> Self {
        Self {
            stall_timeout: Duration::from_secs(45),
            complex_prompt_chars: 280,
            event_capacity: 256,
        }
    }
}

impl ConversationOptions {
    pub fn from_config(config: &HavenConfig) -> Self {
        Self {
            stall_timeout: Duration::from_secs(config.api.stall_timeout_secs),
            complex_prompt_chars: config.exchange.complex_prompt_chars as usize,
            ..Default::default()
        }
    }
}

/// Per-send overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    /// Force the complex flag instead of classifying the prompt.
    pub complex: Option<bool>,
}

/// How a send ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The prompt was blank; nothing was sent or changed.
    Ignored,
    /// The reply completed.
    Completed {
        message_id: MessageId,
        session_ref: Option<SessionRef>,
    },
}

/// A prompt is complex when it runs past `threshold` characters or spans
/// several lines.
pub fn is_complex_prompt(prompt: &str, threshold: usize) -> bool {
    prompt.chars().count() > threshold || prompt.trim().contains('\n')
}

/// Clears the `busy` flag on drop, so it is released even if the future
/// is dropped or returns early.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    /// Acquire the busy flag. Fails with `ChatError::Busy` if it is held.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self, ChatError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(ChatError::Busy);
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
