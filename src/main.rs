//! frps multi-user admission plugin server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                 FRPS-ACL                      │
//!   frps              │  ┌──────────┐   ┌────────────┐   ┌─────────┐  │
//!   POST /handler ────┼─▶│  plugin  │──▶│ dispatcher │──▶│ policy  │  │
//!                     │  │ handler  │   └────────────┘   └────┬────┘  │
//!                     │  └──────────┘                         │ read  │
//!                     │                                       ▼       │
//!   admin UI / CLI    │  ┌──────────┐                   ┌─────────┐   │
//!   /tokens /add ... ─┼─▶│  admin   │──────── write ───▶│ AclStore│   │
//!                     │  │ handlers │                   └────┬────┘   │
//!                     │  └──────────┘                        │ save   │
//!                     │                                      ▼        │
//!                     │                               tokens.ini      │
//!                     └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use frps_acl::acl::AclStore;
use frps_acl::config::{load_config, validate_config, PluginConfig};
use frps_acl::http::HttpServer;
use frps_acl::lifecycle::Shutdown;
use frps_acl::observability::{logging, metrics};
use frps_acl::storage::IniFile;

#[derive(Parser, Debug)]
#[command(name = "frps-acl", version, about = "Multi-user admission plugin for frps")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override tokens.path
    #[arg(short, long)]
    tokens: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PluginConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(tokens) = args.tokens {
        config.tokens.path = tokens;
    }
    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("frps-acl v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tokens = %config.tokens.path,
        admin_enabled = config.admin.enabled,
        admin_auth = config.admin.requires_auth(),
        "Configuration loaded"
    );
    if config.admin.enabled && !config.admin.requires_auth() {
        tracing::warn!("Admin API is enabled without credentials");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let backend = IniFile::new(&config.tokens.path, config.tokens.create_if_missing);
    let store = Arc::new(AclStore::open(Box::new(backend))?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
