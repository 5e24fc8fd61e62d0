//! Frame decoding for the exchange response stream.
//!
//! Each complete line of the response body is either a `data: <json>` frame
//! or noise (blank separators, keepalives, comments). Recognised payloads
//! decode into the strict [`Frame`] union; everything else is skipped.

use haven_common::SessionRef;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::message::{lenient_media, MediaItem};

/// Marker that prefixes every data line.
pub const DATA_PREFIX: &str = "data:";

/// One decoded unit of the response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Incremental reply text.
    Delta { text: String },
    /// End of the reply, with the server's session reference and any media.
    Terminal {
        session_ref: Option<SessionRef>,
        media: Option<Vec<MediaItem>>,
    },
}

/// Why a line did not produce a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("blank line")]
    Blank,
    #[error("line has no data marker")]
    NoMarker,
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("payload has neither text nor done marker")]
    Unrecognized,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    text: Option<String>,
    done: Option<bool>,
    session_ref: Option<String>,
    #[serde(default, deserialize_with = "lenient_media")]
    videos: Option<Vec<MediaItem>>,
}

/// Parse one complete line into a frame.
pub fn parse_line(line: &str) -> Result<Frame, SkipReason> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(SkipReason::Blank);
    }

    let payload = line
        .strip_prefix(DATA_PREFIX)
        .ok_or(SkipReason::NoMarker)?
        .trim();

    let raw: RawPayload =
        serde_json::from_str(payload).map_err(|e| SkipReason::InvalidJson(e.to_string()))?;

    if raw.done == Some(true) {
        if raw.text.as_deref().is_some_and(|t| !t.is_empty()) {
            debug!("terminal frame carried text; text dropped");
        }
        let session_ref = raw
            .session_ref
            .filter(|s| !s.trim().is_empty())
            .map(SessionRef::from);
        return Ok(Frame::Terminal {
            session_ref,
            media: raw.videos,
        });
    }

    match raw.text {
        Some(text) => Ok(Frame::Delta { text }),
        None => Err(SkipReason::Unrecognized),
    }
}

/// Decode a line, logging and discarding anything that is not a frame.
pub fn decode_line(line: &str) -> Option<Frame> {
    match parse_line(line) {
        Ok(frame) => Some(frame),
        Err(SkipReason::Blank) => None,
        Err(SkipReason::NoMarker) => {
            trace!(line, "skipping non-data line");
            None
        }
        Err(reason) => {
            warn!(%reason, line = %truncate_for_log(line), "skipping undecodable frame");
            None
        }
    }
}

fn truncate_for_log(line: &str) -> String {
    line.chars().take(120).collect()
}
