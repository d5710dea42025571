use std::path::{Path, PathBuf};

/// Interactive flags the engine is launched with.
///
/// The trailing `-` makes the engine read commands from stdin instead of argv.
pub const DEFAULT_ARGS: &[&str] = &["-NoLogo", "-NoExit", "-Command", "-"];

/// Engine executable used when [`EngineConfig::executable`] is not set.
pub fn default_executable() -> &'static Path {
    if cfg!(windows) {
        Path::new("powershell.exe")
    } else {
        Path::new("pwsh")
    }
}

/// How to launch the engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Executable override. Default: [`default_executable`] for the host.
    pub executable: Option<PathBuf>,
    /// Command-line arguments. Default: [`DEFAULT_ARGS`].
    pub args: Vec<String>,
    /// Extra environment variables for the engine.
    pub env: Vec<(String, String)>,
    /// Working directory for the engine. Default: inherited.
    pub working_dir: Option<PathBuf>,
    /// Kill the engine if the supervisor is dropped without `terminate`.
    pub kill_on_drop: bool,
}

impl EngineConfig {
    /// Config for an explicit executable with the default interactive flags.
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(executable.into()),
            ..Self::default()
        }
    }

    /// Replace the argument list.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The executable that will actually be spawned.
    pub fn resolved_executable(&self) -> &Path {
        self.executable
            .as_deref()
            .unwrap_or(default_executable())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: None,
            args: DEFAULT_ARGS.iter().map(|arg| (*arg).to_string()).collect(),
            env: Vec::new(),
            working_dir: None,
            kill_on_drop: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reads_commands_from_stdin() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.args.last().map(String::as_str), Some("-"));
        assert_eq!(cfg.resolved_executable(), default_executable());
        assert!(cfg.kill_on_drop);
    }

    #[test]
    fn executable_override_keeps_default_flags() {
        let cfg = EngineConfig::with_executable("/opt/microsoft/powershell/7/pwsh");
        assert_eq!(
            cfg.resolved_executable(),
            Path::new("/opt/microsoft/powershell/7/pwsh")
        );
        assert_eq!(cfg.args, DEFAULT_ARGS);
    }

    #[test]
    fn resolved_executable_borrows_from_short_lived_config() {
        fn resolve(cfg: &EngineConfig) -> PathBuf {
            cfg.resolved_executable().to_path_buf()
        }

        let resolved = {
            let cfg = EngineConfig {
                executable: None,
                ..EngineConfig::default()
            };
            resolve(&cfg)
        };
        assert_eq!(resolved, default_executable());

        let cfg = EngineConfig::with_executable(format!("/usr/local/bin/{}", "pwsh"));
        assert_eq!(resolve(&cfg), PathBuf::from("/usr/local/bin/pwsh"));
    }

    #[test]
    fn args_builder_replaces_flags() {
        let cfg = EngineConfig::with_executable("sh").args(["-c", "cat"]);
        assert_eq!(cfg.args, vec!["-c".to_string(), "cat".to_string()]);
    }

    #[test]
    #[cfg(not(windows))]
    fn default_executable_is_pwsh_off_windows() {
        assert_eq!(default_executable(), Path::new("pwsh"));
    }
}
