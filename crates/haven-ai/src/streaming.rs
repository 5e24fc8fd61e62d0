//! Line reconstruction over a chunked response body.
//!
//! Chunks arrive with arbitrary boundaries: one line may span several
//! chunks and one chunk may hold several lines. A single carry-over buffer
//! stitches them back together. Bytes left in the buffer when the stream
//! ends are an unterminated line and are discarded, never decoded.

use std::fmt::Display;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::frame::{decode_line, Frame};
use crate::ChatError;

/// Carry-over buffer that turns chunks into complete lines.
///
/// Works on bytes so a multi-byte UTF-8 sequence split across two chunks
/// is reassembled before decoding.
#[derive(Debug, Default)]
pub struct LineBuffer {
    carry: Vec<u8>,
    /// Prefix of `carry` already known to hold no newline.
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.carry[from..].iter().position(|&b| b == b'\n') {
            let end = from + offset;
            lines.push(String::from_utf8_lossy(&self.carry[start..end]).into_owned());
            start = end + 1;
            from = start;
        }
        self.carry.drain(..start);
        self.scanned = self.carry.len();
        lines
    }

    /// Bytes of the current unterminated line.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Drop the unterminated tail, returning how many bytes were discarded.
    pub fn discard(&mut self) -> usize {
        let dropped = self.carry.len();
        self.carry.clear();
        self.scanned = 0;
        dropped
    }
}

/// Longest line accepted before the stream is abandoned.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// How a stream read finished without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The body ended.
    Finished,
    /// The cancellation handle fired.
    Cancelled,
}

/// Read complete lines from `stream`, calling `on_line` for each.
///
/// Cancellation is checked before every read and raced against the read
/// itself; each read is bounded by `stall_timeout`.
pub async fn read_lines<S, B, E>(
    mut stream: S,
    cancel: &CancellationToken,
    stall_timeout: Duration,
    mut on_line: impl FnMut(String),
) -> Result<StreamEnd, ChatError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut buffer = LineBuffer::new();

    loop {
        if cancel.is_cancelled() {
            return Ok(StreamEnd::Cancelled);
        }

        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            next = tokio::time::timeout(stall_timeout, stream.next()) => next,
        };

        let chunk = match next {
            Err(_) => return Err(ChatError::StallTimeout(stall_timeout.as_millis() as u64)),
            Ok(None) => break,
            Ok(Some(Err(e))) => return Err(ChatError::Network(e.to_string())),
            Ok(Some(Ok(chunk))) => chunk,
        };

        for line in buffer.push(chunk.as_ref()) {
            on_line(line);
        }
        if buffer.pending() > MAX_LINE_BYTES {
            return Err(ChatError::Parse(format!(
                "line exceeds {MAX_LINE_BYTES} bytes without a newline"
            )));
        }
    }

    let dropped = buffer.discard();
    if dropped > 0 {
        debug!(bytes = dropped, "discarding unterminated trailing line");
    }
    Ok(StreamEnd::Finished)
}

/// Read and decode frames from `stream`, calling `on_frame` for each one in
/// arrival order. Lines that are not frames are skipped.
pub async fn read_frames<S, B, E>(
    stream: S,
    cancel: &CancellationToken,
    stall_timeout: Duration,
    mut on_frame: impl FnMut(Frame),
) -> Result<StreamEnd, ChatError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    read_lines(stream, cancel, stall_timeout, |line| {
        if let Some(frame) = decode_line(&line) {
            on_frame(frame);
        }
    })
    .await
}
