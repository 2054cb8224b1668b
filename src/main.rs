use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use retail_fusion::config::Config;
use retail_fusion::pipeline::Engine;
use retail_fusion::server;

const DEFAULT_CONFIG: &str = "/etc/retail-fusion/config.toml";

#[derive(Parser, Debug)]
#[command(name = "retail-fusion", about = "Simulated retail analytics feed")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen address from the config
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate config and exit
    #[arg(long)]
    check: bool,

    /// Print version and exit
    #[arg(short, long)]
    version: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("retail-fusion {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration
    let path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG);
    let mut config = Config::load_or_default(path, cli.config.is_some())?;
    if let Some(bind) = cli.bind {
        config.service.bind = bind;
    }

    if cli.check {
        println!("Configuration is valid.");
        return Ok(());
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.service.bind,
        products = config.catalog.len(),
        seeded = config.service.seed.is_some(),
        "Starting Retail Fusion"
    );

    if let Err(e) = run(config).await {
        error!(error = %e, "Service terminated with error");
        return Err(e);
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(&config.service.log_level)
        });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

async fn run(config: Config) -> Result<()> {
    let engine = Arc::new(Engine::new(&config)?);
    let app = server::router(engine);

    let listener = tokio::net::TcpListener::bind(&config.service.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.service.bind))?;
    info!(addr = %config.service.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Received shutdown signal, exiting");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
