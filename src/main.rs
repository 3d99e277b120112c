//! Stratum relay binary.

use std::path::PathBuf;

use clap::Parser;

use stratum_relay::config::load_config;
use stratum_relay::lifecycle::{signals, Shutdown};
use stratum_relay::observability::logging;
use stratum_relay::RelayServer;

#[derive(Parser)]
#[command(name = "stratum-relay")]
#[command(about = "Stratum relay that rewrites the worker name on authorize", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.log_level);

    tracing::info!(
        config = %cli.config.display(),
        listen = %config.listen_address(),
        upstream = %config.upstream_address(),
        max_connections = config.max_connections,
        "Configuration loaded"
    );

    let server = RelayServer::new(config);
    let listener = server.bind().await?;

    let shutdown = Shutdown::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match signals::wait_for_termination().await {
                Ok(name) => tracing::info!(signal = name, "Received exit signal"),
                Err(e) => tracing::error!(error = %e, "Failed to install signal handlers"),
            }
            shutdown.trigger();
        }
    });

    server.run(listener, shutdown.token()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
