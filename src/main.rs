//! clipocr - Main Entry Point
//!
//! Single-shot: run with no arguments, exit zero on success. Any failure
//! propagates to the top level and terminates the run with a diagnostic
//! on stderr.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipocr::{app, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Starting clipocr v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_default()?;
    info!("Configuration loaded");

    app::run(config).await?;
    Ok(())
}

fn init_logging() {
    // stdout stays clean; all diagnostics go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clipocr=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
