//! Incremental SSE frame decoder.
//!
//! The upstream transport delivers newline-delimited `data:` event frames,
//! but network chunk boundaries are independent of frame boundaries: one
//! frame may arrive split across chunks, and one chunk may carry several
//! frames. [`FrameDecoder`] owns a private byte buffer, drains every
//! complete line per feed, and holds the trailing unterminated line back
//! for the next chunk. It never emits a delta it has not fully reassembled.
//!
//! Buffering bytes (not strings) keeps decoding chunk-boundary-invariant
//! even when a multi-byte UTF-8 scalar is split across chunks.

use super::types::ChatCompletionChunk;

/// Marker prefix of a data event line.
const DATA_PREFIX: &str = "data: ";

/// Sentinel payload signalling normal stream completion.
const DONE_SENTINEL: &str = "[DONE]";

/// A decoded event frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An incremental fragment of assistant text.
    Delta(String),
    /// The stream completed normally.
    Done,
}

/// Stateful incremental parser for the provider's SSE stream.
///
/// Owned exclusively by one active stream; discarded when the stream ends.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen. Further feeds are inert.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one network chunk, returning every frame completed by it.
    ///
    /// Frames are returned in arrival order. Processing stops at the
    /// `[DONE]` sentinel; anything buffered past it is discarded.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        if self.done {
            return frames;
        }

        self.buffer.extend_from_slice(chunk);

        // Drain complete lines; the last, possibly partial, line stays
        // buffered until its terminator arrives.
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            match self.decode_line(line) {
                Some(Frame::Done) => {
                    self.done = true;
                    self.buffer.clear();
                    frames.push(Frame::Done);
                    return frames;
                }
                Some(frame) => frames.push(frame),
                None => {}
            }
        }

        frames
    }

    /// Decode one complete line into a frame.
    ///
    /// Non-data lines (keep-alives, comments, blanks) and malformed or
    /// content-free payloads yield nothing; a single malformed frame never
    /// aborts the stream.
    fn decode_line(&self, line: &[u8]) -> Option<Frame> {
        let line = String::from_utf8_lossy(line);
        let payload = line.strip_prefix(DATA_PREFIX)?.trim();

        if payload == DONE_SENTINEL {
            return Some(Frame::Done);
        }

        match serde_json::from_str::<ChatCompletionChunk>(payload) {
            Ok(chunk) => chunk.content_delta().map(Frame::Delta),
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed stream frame");
                None
            }
        }
    }
}
