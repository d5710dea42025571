use std::path::PathBuf;

use shellwire_envelope::ChannelConfig;
use shellwire_frame::FrameConfig;
use shellwire_process::EngineConfig;

/// Everything needed to stand up a pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// How to launch the engine.
    pub engine: EngineConfig,
    /// Frame sentinels and buffering limit.
    pub frame: FrameConfig,
    /// Broadcast channel sizing.
    pub channels: ChannelConfig,
    /// Scratch directory forwarded to the encoder untouched.
    pub scratch_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Config for an explicit engine executable.
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            engine: EngineConfig::with_executable(executable),
            ..Self::default()
        }
    }
}
