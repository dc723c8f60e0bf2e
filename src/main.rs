use std::path::PathBuf;

use clap::Parser;

use doppler_proxy::config::loader::{apply_env_overrides, load_config, API_KEY_ENV};
use doppler_proxy::config::validation::validate_config;
use doppler_proxy::config::{ConfigError, ProxyConfig};
use doppler_proxy::lifecycle::startup;
use doppler_proxy::observability::logging::init_logging;
use doppler_proxy::Shutdown;

#[derive(Parser)]
#[command(name = "doppler-proxy")]
#[command(about = "Reverse proxy that reports AI agent traffic", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = ProxyConfig::default();
            apply_env_overrides(&mut config, std::env::var(API_KEY_ENV).ok());
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    init_logging(&config.observability);

    tracing::info!("doppler-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        collector = %config.collector.endpoint,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config, Shutdown::new()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
