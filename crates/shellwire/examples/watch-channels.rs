//! Subscribe to every output category while commands run.
//!
//! Run with:
//!   cargo run --example watch-channels

use shellwire::envelope::Category;
use shellwire::pipeline::{Pipeline, PipelineConfig, PowerShellEncoder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::spawn(PipelineConfig::default(), PowerShellEncoder::new())?;

    for category in Category::ALL {
        let mut rx = pipeline.subscribe(category);
        tokio::spawn(async move {
            while let Ok(value) = rx.recv().await {
                eprintln!("[{category}] {}", serde_json::to_string(&value).unwrap_or_default());
            }
        });
    }

    let commands = [
        "Write-Output 'hello'",
        "Write-Warning 'disk almost full'",
        "Write-Verbose 'probing' -Verbose",
        "Write-Error 'Access denied'",
        "Write-Information 'fyi'",
    ];
    let handles: Vec<_> = commands
        .iter()
        .map(|command| pipeline.submit_default(*command))
        .collect();
    for handle in handles {
        handle.await?;
    }

    pipeline.shutdown_and_wait().await;
    Ok(())
}
