//! DropVault HTTP server.
//!
//! Serves the dead-drop mailbox, the directory-backed database store and the
//! identity endpoints over HTTP/JSON. All state lives under `--data-dir`;
//! the process itself holds nothing that is not also on disk.

mod context;
mod http;
mod http_utils;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dropvault::{LogMailer, PathLocks, Storage, StoreConfig, UserStore};
use tracing_subscriber::{fmt, EnvFilter};

use crate::context::AppContext;

/// DropVault server
#[derive(Parser, Debug)]
#[command(name = "dropvault-server")]
#[command(about = "Dead-drop mailboxes and a directory-backed JSON store over HTTP")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, env = "DROPVAULT_LISTEN", default_value = "0.0.0.0:3000")]
    listen: SocketAddr,

    /// Data directory
    #[arg(short, long, env = "DROPVAULT_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Directory of static files served at `/`
    #[arg(long, env = "DROPVAULT_PUBLIC_DIR")]
    public_dir: Option<PathBuf>,

    /// Lifetime of a login token, in seconds
    #[arg(long, env = "DROPVAULT_TOKEN_TTL_SECS", default_value = "3600")]
    token_ttl_secs: u64,

    /// Deadline for a single store operation, in milliseconds
    #[arg(long, env = "DROPVAULT_REQUEST_TIMEOUT_MS", default_value = "30000")]
    request_timeout_ms: u64,

    /// Attempts at a fresh id before a deposit or insert gives up
    #[arg(long, env = "DROPVAULT_MAX_ID_ATTEMPTS", default_value = "5")]
    max_id_attempts: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,dropvault=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("DropVault server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", args.data_dir.display());

    let config = StoreConfig::builder()
        .data_dir(&args.data_dir)
        .token_ttl(Duration::from_secs(args.token_ttl_secs))
        .max_id_attempts(args.max_id_attempts)
        .build();

    let locks = Arc::new(PathLocks::new());
    let users = Arc::new(
        UserStore::open(&config, Arc::new(LogMailer), Arc::clone(&locks))
            .context("opening identity records")?,
    );
    let storage = Storage::open_with_locks(&config, users.clone(), locks)
        .with_context(|| format!("opening data dir {}", args.data_dir.display()))?;

    let ctx = Arc::new(AppContext {
        storage,
        users,
        request_timeout: Duration::from_millis(args.request_timeout_ms),
    });

    if let Some(dir) = &args.public_dir {
        tracing::info!("Serving static files from {}", dir.display());
    }

    let app = http::app(ctx, args.public_dir);
    let (addr, server) = warp::serve(app)
        .try_bind_with_graceful_shutdown(args.listen, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C, shutting down");
        })
        .with_context(|| format!("binding {}", args.listen))?;

    tracing::info!("Listening on http://{addr}");
    server.await;
    tracing::info!("Server stopped");
    Ok(())
}
