use std::io::ErrorKind;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{FrameError, Result};

/// Writes encoded commands to the engine's input stream.
///
/// A write resolves only once the transport has accepted every byte. When
/// the pipe is congested the underlying `poll_write` parks the task until
/// the engine drains it, so no more data is queued in memory than the
/// caller already holds.
pub struct TransportWriter<W> {
    inner: W,
    bytes_written: u64,
}

impl<W: AsyncWrite + Unpin> TransportWriter<W> {
    /// Create a new transport writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Write text and flush, suspending while the transport is congested.
    pub async fn write(&mut self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes()).await
    }

    /// Write raw bytes and flush.
    pub async fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]).await {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => {
                    offset += n;
                    if offset < bytes.len() {
                        trace!(
                            written = offset,
                            remaining = bytes.len() - offset,
                            "transport congested, waiting for drain"
                        );
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(map_io(err)),
            }
        }
        self.bytes_written += bytes.len() as u64;
        self.flush().await
    }

    /// Flush the underlying stream.
    pub async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await.map_err(map_io)
    }

    /// Close the input stream (the engine sees EOF).
    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown().await.map_err(map_io)
    }

    /// Total bytes accepted by the transport so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

fn map_io(err: std::io::Error) -> FrameError {
    match err.kind() {
        ErrorKind::BrokenPipe | ErrorKind::WriteZero | ErrorKind::ConnectionReset => {
            FrameError::ConnectionClosed
        }
        _ => FrameError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn write_single_command() {
        let mut writer = TransportWriter::new(Vec::<u8>::new());
        writer.write("Get-Date\n").await.unwrap();

        assert_eq!(writer.bytes_written(), 9);
        assert_eq!(writer.into_inner(), b"Get-Date\n");
    }

    #[tokio::test]
    async fn write_is_pending_until_transport_drains() {
        let (host, mut engine) = tokio::io::duplex(16);
        let mut writer = TransportWriter::new(host);
        let command = "x".repeat(256);

        let write = tokio::spawn(async move {
            writer.write(&command).await.unwrap();
            writer
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!write.is_finished(), "write completed while congested");

        let mut received = vec![0u8; 256];
        engine.read_exact(&mut received).await.unwrap();

        let writer = write.await.unwrap();
        assert_eq!(writer.bytes_written(), 256);
        assert!(received.iter().all(|b| *b == b'x'));
    }

    #[tokio::test]
    async fn closed_engine_input_is_connection_closed() {
        let (host, engine) = tokio::io::duplex(16);
        drop(engine);

        let mut writer = TransportWriter::new(host);
        let err = writer.write("Get-Date\n").await.unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[tokio::test]
    async fn zero_length_write_is_connection_closed() {
        let mut writer = TransportWriter::new(ZeroWriter);
        let err = writer.write("x").await.unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[tokio::test]
    async fn interrupted_write_retries() {
        let mut writer = TransportWriter::new(InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        });
        writer.write("retry").await.unwrap();
        assert_eq!(writer.get_ref().data, b"retry");
    }

    #[tokio::test]
    async fn shutdown_signals_eof() {
        let (host, mut engine) = tokio::io::duplex(64);
        let mut writer = TransportWriter::new(host);
        writer.write("exit\n").await.unwrap();
        writer.shutdown().await.unwrap();

        let mut all = String::new();
        engine.read_to_string(&mut all).await.unwrap();
        assert_eq!(all, "exit\n");
    }

    struct ZeroWriter;

    impl AsyncWrite for ZeroWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(0))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl AsyncWrite for InterruptedOnce {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if !self.interrupted {
                self.interrupted = true;
                return Poll::Ready(Err(io::Error::from(ErrorKind::Interrupted)));
            }
            self.data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }
}
