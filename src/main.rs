use anyhow::Result;
use clap::Parser;
use lesson_sync::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

/// Log filter, e.g. `LEARNING_API_LOGGING=debug` or `lesson_sync=debug,reqwest=info`.
const LOG_ENV: &str = "LEARNING_API_LOGGING";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Silent unless asked for; failures already reach the user through the
    // status line and the returned error. Logs go to stderr so they don't
    // tear the status line on stdout.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!("CLI arguments parsed, invoking run");
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
