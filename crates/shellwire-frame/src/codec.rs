use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{debug, warn};

use crate::error::{FrameError, Result};

/// Default marker printed before each frame payload.
pub const DEFAULT_HEAD: &str = "<#SHELLWIRE:HEAD#>";

/// Default marker printed after each frame payload.
pub const DEFAULT_TAIL: &str = "<#SHELLWIRE:TAIL#>";

/// Default limit on buffered, not-yet-terminated output: 64 MiB.
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024 * 1024;

/// The fixed head/tail marker pair bounding every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinels {
    head: String,
    tail: String,
}

impl Sentinels {
    /// Create a sentinel pair. Both markers must be non-empty.
    pub fn new(head: impl Into<String>, tail: impl Into<String>) -> Result<Self> {
        let head = head.into();
        let tail = tail.into();
        if head.is_empty() || tail.is_empty() {
            return Err(FrameError::EmptySentinel);
        }
        Ok(Self { head, tail })
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            head: DEFAULT_HEAD.to_string(),
            tail: DEFAULT_TAIL.to_string(),
        }
    }
}

/// One complete frame payload, sentinels stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw bytes found strictly between head and tail.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload as text, replacing invalid UTF-8.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Configuration for frame extraction.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Head/tail markers.
    pub sentinels: Sentinels,
    /// Maximum bytes buffered while waiting for a tail sentinel. Default: 64 MiB.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            sentinels: Sentinels::default(),
            max_frame_size: DEFAULT_MAX_FRAME,
        }
    }
}

/// Extract the next frame from a buffer.
///
/// Returns `None` until the buffer holds a tail sentinel. On success,
/// everything up to and including the tail is consumed from the buffer.
///
/// Head and tail are located independently. If the first tail precedes every
/// head, the frame is emitted with an empty payload; producers must print the
/// head before the tail.
pub fn extract_frame(src: &mut BytesMut, sentinels: &Sentinels) -> Option<Frame> {
    extract_from(src, sentinels, 0)
}

fn extract_from(src: &mut BytesMut, sentinels: &Sentinels, tail_from: usize) -> Option<Frame> {
    let head = sentinels.head.as_bytes();
    let tail = sentinels.tail.as_bytes();

    let tail_at = find(src, tail, tail_from)?;
    let head_at = find(&src[..tail_at], head, 0);

    let mut consumed = src.split_to(tail_at + tail.len());
    let payload = match head_at {
        Some(at) => {
            consumed.truncate(tail_at);
            consumed.advance(at + head.len());
            consumed.freeze()
        }
        None => {
            warn!(
                discarded = consumed.len(),
                "tail sentinel without preceding head; emitting empty frame"
            );
            Bytes::new()
        }
    };

    Some(Frame { payload })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// [`Decoder`] yielding one [`Frame`] per head/tail pair.
///
/// Remembers how far it has already searched for the tail so large frames
/// arriving in many chunks are not rescanned from the start.
#[derive(Debug, Clone)]
pub struct SentinelCodec {
    config: FrameConfig,
    scanned: usize,
}

impl SentinelCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config, scanned: 0 }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Default for SentinelCodec {
    fn default() -> Self {
        Self::new(FrameConfig::default())
    }
}

impl Decoder for SentinelCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if let Some(frame) = extract_from(src, &self.config.sentinels, self.scanned) {
            self.scanned = 0;
            debug!(payload_size = frame.payload.len(), "frame extracted");
            return Ok(Some(frame));
        }

        if src.len() > self.config.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: src.len(),
                max: self.config.max_frame_size,
            });
        }

        // A tail may straddle the next chunk boundary.
        let overlap = self.config.sentinels.tail.len() - 1;
        self.scanned = src.len().saturating_sub(overlap);
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() {
            debug!(
                residual = src.len(),
                "discarding unterminated output at end of stream"
            );
            src.clear();
            self.scanned = 0;
        }
        Ok(None)
    }
}
