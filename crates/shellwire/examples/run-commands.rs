//! Run a few commands on one PowerShell engine and print their results.
//!
//! Run with:
//!   cargo run --example run-commands
//!
//! Set `SHELLWIRE_EXECUTABLE` to use an engine other than `pwsh`.

use shellwire::envelope::OutputFormat;
use shellwire::pipeline::{Pipeline, PipelineConfig, PowerShellEncoder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::var_os("SHELLWIRE_EXECUTABLE") {
        Some(executable) => PipelineConfig::with_executable(executable),
        None => PipelineConfig::default(),
    };
    let pipeline = Pipeline::spawn(config, PowerShellEncoder::new())?;
    eprintln!("Engine started (pid {:?})", pipeline.pid());

    // Submitted together, answered one at a time in this order.
    let date = pipeline.submit_default("Get-Date -Format o");
    let location = pipeline.submit("Get-Location", OutputFormat::Text);
    let missing = pipeline.submit_default("Get-Item ./does-not-exist");

    println!("date:     {}", serde_json::to_string(&date.await?.success)?);
    println!("location: {}", serde_json::to_string(&location.await?.success)?);

    let missing = missing.await?;
    println!("errors:   {}", serde_json::to_string(&missing.error)?);

    pipeline.shutdown_and_wait().await;
    Ok(())
}
