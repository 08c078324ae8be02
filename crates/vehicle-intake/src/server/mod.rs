//! The HTTP front end: intake form, report page and workbook download.

pub mod handlers;
pub mod render;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

pub use state::AppState;

/// Headroom above the document limit for the text fields and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .intake
        .max_upload_bytes
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/report", get(handlers::report))
        .route("/export.xlsx", get(handlers::export))
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the stores named by `config` and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the stores cannot be opened, the address cannot be
/// bound, or the server fails while running.
pub async fn serve(config: Config) -> Result<()> {
    let addr = config.bind_addr()?;
    let state = AppState::open(config)?;

    info!(
        database = %state.config.database_path().display(),
        documents = %state.config.upload_dir().display(),
        "Stores opened"
    );

    let listener = TcpListener::bind(addr).await.map_err(|source| Error::Bind {
        addr: addr.to_string(),
        source,
    })?;
    info!("Listening on http://{addr}");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
