mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, EngineArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputMode;

#[derive(Parser, Debug)]
#[command(
    name = "shellwire",
    version,
    about = "Run commands on a long-lived PowerShell engine"
)]
struct Cli {
    /// How results are printed (default: table on a terminal, json otherwise).
    #[arg(long, value_name = "MODE", global = true)]
    output: Option<OutputMode>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let mode = cli.output.unwrap_or_else(OutputMode::default_for_stdout);
    let result = cmd::run(cli.command, &cli.engine, mode);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
