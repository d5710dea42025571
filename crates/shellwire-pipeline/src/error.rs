/// Errors that can occur in pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The engine process could not be started.
    #[error("engine process error: {0}")]
    Process(#[from] shellwire_process::ProcessError),

    /// Writing a command to the engine failed.
    #[error("transport write failed: {0}")]
    Transport(#[source] shellwire_frame::FrameError),

    /// Reading the engine's output stream failed.
    #[error("engine output unreadable: {0}")]
    Output(#[source] shellwire_frame::FrameError),

    /// The engine closed its output before answering.
    #[error("engine exited before answering")]
    EngineExited,

    /// The command's frame could not be decoded.
    #[error("result parse failed: {0}")]
    Parse(#[from] shellwire_envelope::ParseError),

    /// The command was queued behind one that hit a fatal engine error.
    #[error("pipeline aborted after a fatal engine error")]
    Aborted,

    /// The pipeline was shut down before the command was submitted.
    #[error("pipeline shut down")]
    ShutDown,

    /// The pipeline task is gone.
    #[error("pipeline closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
