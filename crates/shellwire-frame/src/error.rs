/// Errors that can occur while extracting or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Buffered output grew past the configured limit without a tail sentinel.
    #[error("frame too large ({size} bytes buffered, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A sentinel was configured as an empty string.
    #[error("frame sentinels must not be empty")]
    EmptySentinel,

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine closed its input stream.
    #[error("connection closed (engine input stream gone)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
