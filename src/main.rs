//! Product data service.
//!
//! Serves the SKU/product store over HTTP, backed by the in-process store.
//!
//! Usage:
//!   product-data --config config.json --port 8080

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use product_data::{http, Config, InMemoryEntryStore, ProductData};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "product-data")]
#[command(about = "SKU to product mapping service")]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long, env = "PRODUCT_DATA_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PRODUCT_DATA_PORT")]
    port: Option<u16>,

    /// Maximum entries returned by one query
    #[arg(long, env = "PRODUCT_DATA_RESPONSE_LIMIT")]
    response_limit: Option<usize>,

    /// error, warn, info, debug or trace
    #[arg(long, env = "PRODUCT_DATA_LOGGING_LEVEL")]
    logging_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<Config, product_data::ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(limit) = self.response_limit {
            config.response_limit = limit;
        }
        if let Some(level) = self.logging_level {
            config.logging_level = level;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config()?;

    let rust_log = std::env::var("RUST_LOG").ok();
    FmtSubscriber::builder()
        .with_env_filter(log_filter(rust_log.as_deref(), config.log_level()?))
        .with_target(false)
        .compact()
        .init();

    info!(
        service = %config.service_name,
        response_limit = config.response_limit,
        "product data service starting"
    );

    let store = InMemoryEntryStore::with_max_ops(config.max_ops_per_call);
    let service = Arc::new(ProductData::new(store));

    http::serve_with_shutdown(service, &config, shutdown_signal()).await?;
    info!("product data service stopped");
    Ok(())
}

/// `RUST_LOG` directives when set and valid, else the configured level.
fn log_filter(rust_log: Option<&str>, level: Level) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.into()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
