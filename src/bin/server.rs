//! restkv Server Binary
//!
//! Starts the REST API server backed by the in-memory store.

use std::sync::Arc;

use clap::Parser;
use restkv::store::MemoryStore;
use restkv::{Config, RestServer};
use tracing_subscriber::{fmt, EnvFilter};

/// restkv Server
#[derive(Parser, Debug)]
#[command(name = "restkv-server")]
#[command(about = "REST API server for Redis-compatible key-value stores")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Backing store to execute commands against. Only the built-in
    /// "memory" store is available from the command line; other backing
    /// stores can be plugged in through the library's ConnFactory trait.
    #[arg(short, long, default_value = "memory")]
    store: String,

    /// API token to accept as authorized
    #[arg(short = 't', long, env = "RESTKV_API_TOKEN", default_value = "")]
    api_token: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,restkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("restkv Server v{}", restkv::VERSION);
    tracing::info!("Listen address: {}", args.addr);

    if args.store != "memory" {
        tracing::error!(
            "unsupported store '{}': only 'memory' is available from the command line",
            args.store
        );
        std::process::exit(1);
    }
    if args.api_token.is_empty() {
        tracing::warn!("no API token configured, requests without credentials are accepted");
    }

    let config = Config::builder()
        .listen_addr(&args.addr)
        .api_token(&args.api_token)
        .build();

    let server = RestServer::new(config, Arc::new(MemoryStore::new()));
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
