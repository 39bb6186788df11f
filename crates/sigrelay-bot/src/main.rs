//! sigrelay - entry point.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

/// Telegram-to-PostgreSQL relay with a REST API for messages and trade signals
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Optional TOML configuration file, overridden by environment variables
    #[arg(short, long, env = "SIGRELAY_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env is optional
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = sigrelay_bot::AppConfig::load(args.config.as_deref())?;

    sigrelay_telemetry::init_logging(config.environment.as_deref())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        port = config.api.port,
        "Starting sigrelay"
    );

    let app = sigrelay_bot::Application::new(config)?;
    let shutdown = app.shutdown_handle();
    sigrelay_bot::install_panic_hook(shutdown.clone());

    tokio::spawn(async move {
        if let Err(e) = sigrelay_bot::wait_for_signal(shutdown.clone()).await {
            error!(error = %e, "Failed to install signal handlers");
            shutdown.trigger("signal handler failure");
        }
    });

    match app.run().await {
        Ok(sigrelay_bot::ExitStatus::Clean) => Ok(ExitCode::SUCCESS),
        Ok(status) => std::process::exit(status.code()),
        Err(e) => {
            error!(error = %e, "sigrelay failed");
            Ok(ExitCode::FAILURE)
        }
    }
}
