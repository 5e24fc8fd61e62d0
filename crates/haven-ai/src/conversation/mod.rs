//! Conversation ownership.
//!
//! A `Conversation` owns one session state store and is the only thing
//! that mutates it: sending a prompt, loading a stored session, starting a
//! new session, and dismissing errors. Sends and loads are mutually
//! exclusive; resets and cancellation are always allowed and abort
//! whatever is in flight.

mod chat;
mod load;
mod manager;
mod types;

pub use manager::Conversation;
pub use types::{is_complex_prompt, ConversationOptions, SendOptions, SendOutcome};
