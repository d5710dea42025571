use shellwire_envelope::OutputFormat;
use shellwire_pipeline::{Pipeline, PipelineConfig, PipelineError, PowerShellEncoder};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::cmd::{runtime, EngineArgs, ReplArgs};
use crate::exit::{io_error, pipeline_error, CliResult, SUCCESS};
use crate::output::{print_envelope, OutputMode};

pub fn run(args: ReplArgs, engine: &EngineArgs, mode: OutputMode) -> CliResult<i32> {
    let config = engine.pipeline_config();
    runtime()?.block_on(repl(config, args.format, mode))
}

async fn repl(config: PipelineConfig, format: OutputFormat, mode: OutputMode) -> CliResult<i32> {
    let pipeline = Pipeline::spawn(config, PowerShellEncoder::new())
        .map_err(|err| pipeline_error("engine start failed", err))?;
    info!(pid = pipeline.pid(), "engine ready; one command per line");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.map_err(|err| io_error("stdin read failed", err))?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        let outcome = tokio::select! {
            outcome = pipeline.submit(command, format) => outcome,
            _ = tokio::signal::ctrl_c() => break,
        };
        match outcome {
            Ok(envelope) => print_envelope(command, format, &envelope, mode),
            Err(PipelineError::Parse(err)) => {
                eprintln!("error: `{command}`: result could not be decoded: {err}");
            }
            Err(err) => return Err(pipeline_error(&format!("`{command}` failed"), err)),
        }
    }

    info!("shutting down engine");
    pipeline.shutdown_and_wait().await;
    Ok(SUCCESS)
}
