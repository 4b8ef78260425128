//! hnsw-server — HTTP gateway over named HNSW indexes (spec §6).

use clap::Parser;
use hnsw_server::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// hnsw-server - an HTTP gateway over one or more HNSW vector indexes
#[derive(Parser, Debug)]
#[command(name = "hnsw-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory durable-backed indexes store their files under.
    #[arg(long, default_value = "./data", env = "HNSWDB_DATA_DIR")]
    data_dir: String,

    /// Host address to bind to.
    #[arg(long, default_value = "0.0.0.0", env = "HNSWDB_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value = "8088", env = "HNSWDB_PORT")]
    port: u16,

    /// Bearer token every request must present (spec §6).
    #[arg(long, env = "HNSWDB_ADMIN_KEY")]
    admin_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    tracing::info!("starting hnsw-server");
    tracing::info!(data_dir = %args.data_dir, "data directory configured");

    std::fs::create_dir_all(&args.data_dir)?;
    let state = Arc::new(AppState::new(args.admin_key, PathBuf::from(&args.data_dir)));
    let router = hnsw_server::build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
