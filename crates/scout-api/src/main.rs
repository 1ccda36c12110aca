//! `scout-api` binary entrypoint.
//!
//! Loads configuration from environment variables and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::sync::Arc;

use anyhow::Result;

use scout_api::config::Config;
use scout_api::server::Server;
use scout_core::TaskRegistry;
use scout_core::observability::{LogFormat, init_logging};
use scout_core::store::{FsStore, MemoryStore, ResultStore};

fn choose_log_format(config: &Config) -> LogFormat {
    if config.debug {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(choose_log_format(&config));

    let registry = match config.tasks_path.as_deref() {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading task registry from file");
            TaskRegistry::load(path)?
        }
        None => TaskRegistry::builtin()?,
    };

    let store: Arc<dyn ResultStore> = if let Some(dir) = config.data_dir.as_deref() {
        tracing::info!(dir = %dir.display(), "Using filesystem result store");
        Arc::new(FsStore::new(dir))
    } else {
        if !config.debug {
            anyhow::bail!("SCOUT_DATA_DIR is required when SCOUT_DEBUG=false");
        }
        tracing::warn!("SCOUT_DATA_DIR not set; using in-memory result store (debug only)");
        Arc::new(MemoryStore::new())
    };

    let server = Server::with_store(config, registry, store);
    server.serve().await?;
    Ok(())
}
