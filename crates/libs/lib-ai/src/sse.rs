//! Incremental decoder for the upstream streaming protocol.
//!
//! The provider writes newline-delimited frames:
//!
//! ```text
//! data: {"content":"Hel"}
//! data: {"delta":"lo"}
//! data: plain text is passed through
//! data: [DONE]
//! ```
//!
//! Bytes arrive in arbitrary chunks, so a line (or a UTF-8 sequence) may be split
//! across reads. The decoder buffers raw bytes and only decodes complete lines.
//! `\n` never occurs inside a multi-byte UTF-8 sequence, so splitting on it first
//! keeps partial characters intact until the rest arrives.
//!
//! The decoder knows nothing about HTTP; the client feeds it body chunks.

use serde_json::Value;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text fragment to forward.
    Fragment(String),
    /// The sentinel. Nothing after it is read.
    Done,
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk, returning every frame completed by it.
    ///
    /// Decoding stops at the sentinel: it is the last frame returned and any
    /// bytes after it are discarded, now and on later calls.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        if self.done {
            return frames;
        }

        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = self.decode_line(&line) {
                frames.push(frame);
                if self.done {
                    self.buffer.clear();
                    break;
                }
            }
        }

        frames
    }

    /// Flush a final line the upstream left unterminated.
    pub fn finish(&mut self) -> Vec<Frame> {
        if self.done || self.buffer.is_empty() {
            return Vec::new();
        }

        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line).into_iter().collect()
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<Frame> {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches(['\n', '\r']);

        let payload = line.strip_prefix(DATA_PREFIX)?;

        if payload.trim() == DONE_SENTINEL {
            self.done = true;
            return Some(Frame::Done);
        }

        extract_text(payload).map(Frame::Fragment)
    }
}

/// JSON payloads contribute their `content` or `delta` string; anything that is not
/// JSON is forwarded verbatim.
fn extract_text(payload: &str) -> Option<String> {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => ["content", "delta"]
            .iter()
            .filter_map(|key| value.get(key).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .map(String::from),
        Err(_) if payload.is_empty() => None,
        Err(_) => Some(payload.to_string()),
    }
}
