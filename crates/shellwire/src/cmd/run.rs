use std::time::Duration;

use shellwire_pipeline::{Pipeline, PipelineConfig, PipelineError, PowerShellEncoder};
use tracing::{debug, warn};

use crate::cmd::{parse_duration, runtime, EngineArgs, RunArgs};
use crate::exit::{pipeline_error, CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS, TIMEOUT};
use crate::output::{print_envelope, OutputMode};

pub fn run(args: RunArgs, engine: &EngineArgs, mode: OutputMode) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let config = engine.pipeline_config();
    runtime()?.block_on(run_commands(args, config, timeout, mode))
}

async fn run_commands(
    args: RunArgs,
    config: PipelineConfig,
    timeout: Duration,
    mode: OutputMode,
) -> CliResult<i32> {
    let pipeline = Pipeline::spawn(config, PowerShellEncoder::new())
        .map_err(|err| pipeline_error("engine start failed", err))?;

    // Everything is queued up front; the pipeline still runs them one at a time.
    let handles: Vec<_> = args
        .commands
        .iter()
        .map(|command| pipeline.submit(command.as_str(), args.format))
        .collect();

    let mut code = SUCCESS;
    for (command, handle) in args.commands.iter().zip(handles) {
        debug!(id = handle.id(), %command, "awaiting result");
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(envelope)) => {
                if envelope.has_errors() && code == SUCCESS {
                    code = FAILURE;
                }
                print_envelope(command, args.format, &envelope, mode);
            }
            Ok(Err(PipelineError::Parse(err))) => {
                warn!(%command, error = %err, "result could not be decoded");
                eprintln!("error: `{command}`: result could not be decoded: {err}");
                code = DATA_INVALID;
            }
            Ok(Err(err)) => {
                pipeline.shutdown();
                return Err(pipeline_error(&format!("`{command}` failed"), err));
            }
            Err(_) => {
                pipeline.shutdown();
                return Err(CliError::new(
                    TIMEOUT,
                    format!("`{command}` timed out after {}", args.timeout),
                ));
            }
        }
    }

    pipeline.shutdown_and_wait().await;
    Ok(code)
}
