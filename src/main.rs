use anyhow::{Context, Result};
use clap::Parser;
use culture_fit::cli::{handle_command, Cli};
use std::fs::OpenOptions;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "culture_fit=info";

fn init_logging() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // stdout carries the JSON results, so logs go to stderr
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let file_layer = match std::env::var("CULTUREFIT_LOG_FILE") {
        Ok(path) if !path.trim().is_empty() => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(false)
                    .with_span_list(false)
                    .boxed(),
            )
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may set RUST_LOG or CULTUREFIT_LOG_FILE, so load it before logging
    let dotenv = dotenvy::dotenv();
    init_logging()?;
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment file: {}", path.display());
    }

    let cli = Cli::parse();
    handle_command(cli).await
}
