//! Drive a long-lived PowerShell process as an ordered request/response service.
//!
//! shellwire keeps one engine process running, writes commands to its stdin
//! one at a time, and reads each result back as a sentinel-delimited frame.
//!
//! # Crate Structure
//!
//! - [`process`]: spawn and terminate the engine process
//! - [`frame`]: sentinel framing over the engine's output, and the input writer
//! - [`envelope`]: result envelopes, output categories and their broadcast channels
//! - [`pipeline`]: the single-flight command queue and its façade (behind `pipeline` feature)
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use shellwire::pipeline::{Pipeline, PipelineConfig, PowerShellEncoder};
//!
//! let pipeline = Pipeline::spawn(PipelineConfig::default(), PowerShellEncoder::new())?;
//! let envelope = pipeline.submit_default("Get-Date").await?;
//! println!("{}", serde_json::to_string(&envelope.success)?);
//! pipeline.shutdown();
//! # Ok(())
//! # }
//! ```

/// Re-export process supervision types.
pub mod process {
    pub use shellwire_process::*;
}

/// Re-export frame types.
pub mod frame {
    pub use shellwire_frame::*;
}

/// Re-export envelope and category channel types.
pub mod envelope {
    pub use shellwire_envelope::*;
}

/// Re-export pipeline types (requires `pipeline` feature).
#[cfg(feature = "pipeline")]
pub mod pipeline {
    pub use shellwire_pipeline::*;
}
