use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use shellwire_envelope::OutputFormat;
use shellwire_pipeline::PipelineConfig;
use shellwire_process::EngineConfig;

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputMode;

pub mod doctor;
pub mod repl;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run commands in order on one engine and print each result.
    Run(RunArgs),
    /// Read commands from stdin, one per line.
    Repl(ReplArgs),
    /// Check that the engine can be started.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, engine: &EngineArgs, mode: OutputMode) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, engine, mode),
        Command::Repl(args) => repl::run(args, engine, mode),
        Command::Doctor(args) => doctor::run(args, engine, mode),
        Command::Version(args) => version::run(args),
    }
}

/// How to launch the engine; shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Engine executable. Default: pwsh (powershell.exe on Windows).
    #[arg(long, value_name = "PATH", env = "SHELLWIRE_EXECUTABLE", global = true)]
    pub executable: Option<PathBuf>,

    /// Replace the engine's default arguments (repeatable).
    #[arg(
        long = "engine-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        global = true
    )]
    pub engine_args: Vec<String>,

    /// Directory commands run in.
    #[arg(long, value_name = "DIR", env = "SHELLWIRE_SCRATCH_DIR", global = true)]
    pub scratch_dir: Option<PathBuf>,
}

impl EngineArgs {
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            executable: self.executable.clone(),
            ..EngineConfig::default()
        };
        if !self.engine_args.is_empty() {
            config = config.args(self.engine_args.iter().cloned());
        }
        config
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            engine: self.engine_config(),
            scratch_dir: self.scratch_dir.clone(),
            ..PipelineConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Commands to run, in order.
    #[arg(required = true, value_name = "COMMAND")]
    pub commands: Vec<String>,
    /// Serialisation for success output (json, csv, html, text, raw).
    #[arg(long, short = 'f', default_value = "json")]
    pub format: OutputFormat,
    /// Maximum time to wait for each result (e.g. 30s, 500ms, 2m).
    #[arg(long, default_value = "30s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ReplArgs {
    /// Serialisation for success output (json, csv, html, text, raw).
    #[arg(long, short = 'f', default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    /// How long to wait for the engine to exit after the probe.
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("7").unwrap(), Duration::from_secs(7));
    }

    #[test]
    fn rejects_bad_durations() {
        for input in ["", "0s", "abc", "-1s", "5h"] {
            let err = parse_duration(input).unwrap_err();
            assert_eq!(err.code, USAGE, "{input}");
        }
    }

    #[test]
    fn engine_args_replace_defaults() {
        let args = EngineArgs {
            executable: Some(PathBuf::from("sh")),
            engine_args: vec!["-c".to_string(), "cat".to_string()],
            scratch_dir: Some(PathBuf::from("/tmp")),
        };
        let config = args.pipeline_config();
        assert_eq!(config.engine.executable, Some(PathBuf::from("sh")));
        assert_eq!(config.engine.args, vec!["-c", "cat"]);
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn default_engine_args_are_kept() {
        let config = EngineArgs::default().engine_config();
        assert_eq!(config, EngineConfig::default());
    }
}
