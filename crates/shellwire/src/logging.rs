use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Dependencies never log above `warn`.
    fn dependency_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            _ => "warn",
        }
    }
}

/// Log to stderr. `shellwire*` targets log at `level`.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = EnvFilter::new(format!(
        "{},shellwire={}",
        level.dependency_directive(),
        level.as_directive()
    ));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
