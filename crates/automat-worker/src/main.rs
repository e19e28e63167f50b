use anyhow::{Context, Result};
use automat_worker::config::WorkerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Set up monitoring first so configuration warnings are not lost
    automat_monitoring::init(&WorkerConfig::monitoring_from_env())
        .context("Failed to initialize monitoring")?;

    // Load configuration from environment variables
    let config = WorkerConfig::load().context("Failed to load configuration")?;

    // Remaining arguments are inputs to process
    let inputs: Vec<String> = std::env::args().skip(1).collect();

    automat_worker::run(config, inputs)
        .await
        .context("Worker error")?;

    Ok(())
}
