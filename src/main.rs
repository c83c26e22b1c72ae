//! File manager command-line entry point.
//!
//! Parses the command line, loads configuration, initialises logging and
//! hands off to the command dispatcher.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use filemanager_cli::{Cli, load_config};
use filemanager_core::config::AppConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli.config, cli.env.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::debug!(
        config = %cli.config,
        mode = %config.filemanager.mode,
        disk = %config.filemanager.disk,
        "Configuration loaded"
    );

    if let Err(e) = cli.execute(config).await {
        tracing::debug!(error = %e, kind = %e.kind, "Command failed");
        eprintln!("✗ {}", e.user_message());
        std::process::exit(1);
    }
}

/// Initialize tracing/logging. Logs go to stderr so command output stays
/// machine-readable.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
