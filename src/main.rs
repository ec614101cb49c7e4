//! weight-store server binary.
//!
//! Hosts the resident weight store behind an HTTP API so client processes
//! can store serialized model weights once and fetch them from memory on
//! every later run.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use weight_store::config::{Cli, Config};
use weight_store::mem::pages::HeapPages;
use weight_store::metrics::StoreMetrics;
use weight_store::server::api::{build_router, AppState};
use weight_store::store::registry::WeightStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "weight_store=debug,tower_http=debug"
    } else {
        "weight_store=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("weight-store v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?;
    let config = Arc::new(config);

    info!(
        page_size = config.store.page_size,
        max_pages = config.store.max_pages,
        budget_bytes = config.store.budget_bytes(),
        "Store configuration loaded"
    );

    // Build the page provider and the store.
    let pages = Arc::new(HeapPages::with_budget(
        config.store.page_size,
        config.store.max_pages,
    ));
    let store = Arc::new(WeightStore::new(pages));

    // Build application state.
    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        metrics: StoreMetrics::new()?,
        start_time: Instant::now(),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = cli
        .listen
        .unwrap_or_else(|| config.server.listen.clone());
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
