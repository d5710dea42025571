use std::path::PathBuf;

/// Errors that can occur while supervising the engine process.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The engine executable could not be started.
    #[error("failed to spawn engine {}: {source}", executable.display())]
    Spawn {
        executable: PathBuf,
        source: std::io::Error,
    },

    /// The process started but no process identifier was obtained.
    #[error("engine {} started without a process id", executable.display())]
    MissingPid { executable: PathBuf },

    /// A piped stream was requested after it had already been taken.
    #[error("engine {0} stream unavailable")]
    StreamUnavailable(&'static str),

    /// An I/O error occurred while signalling or polling the process.
    #[error("engine process I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProcessError>;
