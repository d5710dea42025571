//! Drive a long-lived engine process like a remote procedure call target.
//!
//! Callers [`Pipeline::submit`] a command string and await a
//! [`CompletionHandle`] that resolves to the categorised
//! [`ResultEnvelope`](shellwire_envelope::ResultEnvelope) once the engine has
//! printed that command's frame. The engine has no request ids, so the
//! pipeline keeps at most one command in flight and answers strictly in
//! submission order.

pub mod config;
pub mod encoder;
pub mod error;
pub mod handle;
pub mod pipeline;
pub mod queue;

pub use config::PipelineConfig;
pub use encoder::{CommandEncoder, PowerShellEncoder};
pub use error::{PipelineError, Result};
pub use handle::CompletionHandle;
pub use pipeline::Pipeline;
pub use queue::QueueState;
