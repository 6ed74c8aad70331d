//! Storefront shim.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                STOREFRONT SHIM               │
//!                       │                                              │
//!     Client Request    │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ──────────────────┼─▶│  http   │───▶│  origin  │───▶│storefront│─┼──▶ GraphQL API
//!                       │  │ server  │    │ resolver │    │ client  │  │
//!                       │  └────┬────┘    └──────────┘    └─────────┘  │
//!                       │       │                                      │
//!                       │       ▼                                      │
//!                       │  ┌─────────┐  GET/HEAD  ┌──────────┐         │
//!                       │  │  proxy  │───────────▶│ rewrite  │         │
//!                       │  │pipeline │            └──────────┘         │
//!     Client Response   │  └────┬────┘  other: relayed as-is           │
//!     ◀─────────────────┼───────┴──────────────────────────────────────┼──── Backend
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use storefront_shim::lifecycle::{self, StartupOptions};

#[derive(Parser, Debug)]
#[command(name = "storefront-shim", version, about = "Serve a headless storefront under your own domain")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let options = StartupOptions {
        config_path: args.config,
        bind_address: args.bind,
        check_only: args.check,
    };

    match lifecycle::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("storefront-shim: {e}");
            ExitCode::FAILURE
        }
    }
}
