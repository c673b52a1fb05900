// Expense Tracker - Web Server
// REST API over the entry store, for the browser client

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::info;

use expense_tracker::api::{self, AppState};
use expense_tracker::{logging, EntryService, EntryStore, Settings};

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let (settings, dotenv_path) =
        Settings::load_with_dotenv().context("failed to load configuration")?;
    logging::init_tracing(&settings.log_level)?;
    if let Some(path) = dotenv_path {
        info!(path = %path.display(), "loaded .env");
    }

    // Open database
    let store = EntryStore::open(&settings.database_path).with_context(|| {
        format!(
            "failed to open database at {}",
            settings.database_path.display()
        )
    })?;
    info!(path = %settings.database_path.display(), entries = store.count()?, "database opened");

    let state = AppState::new(EntryService::new(store));

    let app = api::router(state)
        .layer(api::cors_layer(&settings.cors_origin)?)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    info!(%addr, cors_origin = %settings.cors_origin, "server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
