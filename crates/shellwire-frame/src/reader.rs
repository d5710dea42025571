use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::{Frame, FrameConfig, SentinelCodec};
use crate::error::Result;

/// Reads complete frames from an engine's output stream.
///
/// Handles partial reads internally; callers always get complete frames, in
/// arrival order. The sequence ends when the stream reaches EOF and cannot be
/// restarted.
pub struct FrameReader<R> {
    inner: FramedRead<R, SentinelCodec>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a new frame reader with default sentinels.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: R, config: FrameConfig) -> Self {
        Self {
            inner: FramedRead::new(inner, SentinelCodec::new(config)),
        }
    }

    /// Wait for the next complete frame.
    ///
    /// Returns `Ok(None)` once the stream is closed.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.inner.next().await.transpose()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    /// Current frame configuration.
    pub fn config(&self) -> &FrameConfig {
        self.inner.decoder().config()
    }
}

impl<R: AsyncRead + Unpin> Stream for FrameReader<R> {
    type Item = Result<Frame>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::codec::{Sentinels, DEFAULT_HEAD, DEFAULT_TAIL};
    use crate::error::FrameError;

    fn framed(payload: &str) -> String {
        format!("{DEFAULT_HEAD}{payload}{DEFAULT_TAIL}")
    }

    #[tokio::test]
    async fn read_single_frame() {
        let wire = framed("hello");
        let mut reader = FrameReader::new(wire.as_bytes());

        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"hello");
        assert!(reader.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_multiple_frames_in_order() {
        let wire = [framed("one"), framed("two"), framed("three")].concat();
        let reader = FrameReader::new(wire.as_bytes());

        let payloads: Vec<_> = reader
            .map(|frame| frame.unwrap().payload)
            .collect()
            .await;
        assert_eq!(payloads, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn partial_frame_survives_read_boundaries() {
        let (mut engine, host) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(host);

        let writer = tokio::spawn(async move {
            let wire = framed(r#"{"result":{"success":"[]"}}"#);
            for chunk in wire.as_bytes().chunks(3) {
                engine.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), br#"{"result":{"success":"[]"}}"#);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn waits_for_tail_before_yielding() {
        let (mut engine, host) = tokio::io::duplex(256);
        let mut reader = FrameReader::new(host);

        engine
            .write_all(format!("{DEFAULT_HEAD}half").as_bytes())
            .await
            .unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(50), reader.next_frame()).await;
        assert!(pending.is_err(), "no frame before tail sentinel");

        engine
            .write_all(format!("-done{DEFAULT_TAIL}").as_bytes())
            .await
            .unwrap();
        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"half-done");
    }

    #[tokio::test]
    async fn custom_sentinels_from_config() {
        let config = FrameConfig {
            sentinels: Sentinels::new("[[", "]]").unwrap(),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(&b"noise[[x]]"[..], config);

        assert_eq!(reader.config().sentinels.head(), "[[");
        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"x");
    }

    #[tokio::test]
    async fn oversized_output_is_an_error() {
        let config = FrameConfig {
            max_frame_size: 16,
            ..FrameConfig::default()
        };
        let wire = format!("{DEFAULT_HEAD}{}", "x".repeat(64));
        let mut reader = FrameReader::with_config(wire.as_bytes(), config);

        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn closed_stream_ends_sequence() {
        let mut reader = FrameReader::new(&b""[..]);
        assert!(reader.next_frame().await.unwrap().is_none());
    }
}
