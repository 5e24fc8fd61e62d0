//! HTTP client for the assistant service.
//!
//! One exchange endpoint that answers with a streamed body, plus the
//! session collection used by the directory and the loader.

mod api;
mod client;
pub mod wire;

pub use client::HavenClient;
pub use wire::{
    ExchangeRequest, HistoryEntry, Part, RawTimestamp, SessionFetchResponse, SessionListResponse,
    StoredSession, StoredSessionRecord,
};
