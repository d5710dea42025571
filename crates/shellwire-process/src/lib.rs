//! Engine subprocess supervision.
//!
//! Owns the lifecycle of the long-lived interactive engine (a shell-like
//! process that reads commands from stdin):
//! - spawning it with piped stdin/stdout/stderr
//! - handing out the three byte streams exactly once
//! - liveness checks and terminate-without-wait
//!
//! This is the lowest layer of shellwire. There is no respawn: one
//! [`EngineProcess`] per pipeline, for the pipeline's whole life.

pub mod config;
pub mod error;
pub mod process;

pub use config::{default_executable, EngineConfig, DEFAULT_ARGS};
pub use error::{ProcessError, Result};
pub use process::{EngineIo, EngineProcess};
