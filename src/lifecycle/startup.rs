//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Start the config watcher
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{load_or_default, validate_config, ConfigError, ConfigWatcher, ShimConfig};
use crate::http::server::{HttpServer, StateError};
use crate::lifecycle::Shutdown;
use crate::observability::{init_logging, init_metrics};

/// Command-line choices that shape startup.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    /// Overrides `listener.bind_address`.
    pub bind_address: Option<String>,
    /// Validate the configuration and exit.
    pub check_only: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("failed to build server: {0}")]
    State(#[from] StateError),

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the effective configuration for `options`.
pub fn effective_config(options: &StartupOptions) -> Result<ShimConfig, ConfigError> {
    let mut config = load_or_default(options.config_path.as_deref())?;
    if let Some(bind) = &options.bind_address {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

/// Run the shim until SIGINT/SIGTERM.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let config = effective_config(&options)?;

    if options.check_only {
        println!("Configuration OK");
        return Ok(());
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "storefront-shim starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        store_domain = %config.storefront.store_domain,
        public_origin = ?config.listener.public_origin,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Without a file there is nothing to watch; the sender is kept so the
    // reload task idles instead of exiting.
    let (_watcher, _idle_tx, config_updates) = match &options.config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run(config.clone())?), None, rx)
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (None, Some(tx), rx)
        }
    };

    let server = HttpServer::new(config.clone())?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signals = shutdown.spawn_signal_listener();
    server.run(listener, config_updates, shutdown.subscribe()).await?;
    signals.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
