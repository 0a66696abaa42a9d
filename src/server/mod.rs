//! Local HTTP endpoint for the web front end.

mod handlers;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::llm::TextGenerator;
use crate::session::SessionOptions;

pub use handlers::{ApiError, GenerateRequest, GenerateResponse, SetupRequest, SetupResponse};

/// Default port, matching the web front end's expectations.
pub const DEFAULT_PORT: u16 = 5000;

/// Shared, read-only state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub options: SessionOptions,
    /// Used when a request does not name a project directory.
    pub default_project_dir: PathBuf,
}

impl AppState {
    fn project_dir(&self, requested: &str) -> PathBuf {
        let requested = requested.trim();
        if requested.is_empty() {
            self.default_project_dir.clone()
        } else {
            PathBuf::from(requested)
        }
    }
}

/// Build the application router.
///
/// CORS is permissive: the web front end is served from a different origin
/// and posts JSON, which needs a preflight.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/generateCommitMessage",
            post(handlers::generate_commit_message),
        )
        .route("/setup", post(handlers::setup))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already bound listener until the process exits.
pub async fn serve_on(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

/// Bind `addr` and serve.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, state).await
}
