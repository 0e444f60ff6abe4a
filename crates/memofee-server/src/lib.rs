//! MemoFee HTTP server.
//!
//! Hosts the memo API, server-side feed retrieval, and the static client.
//! Default: http://127.0.0.1:8000/

mod error;
mod routes;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use memofee_core::api::paths;
use memofee_core::feed::FeedFetcher;
use memofee_core::storage::MemoFile;
use memofee_core::{AppConfig, Result};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared handler state
pub struct ServerState {
    pub memos: MemoFile,
    pub fetcher: FeedFetcher,
}

impl ServerState {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            memos: MemoFile::new(config.memo_file_path()),
            fetcher: FeedFetcher::new(config)?,
        })
    }
}

/// Build the application router.
///
/// Paths outside the API are served from `static_dir`; anything that is not a
/// file there gets `index.html` so client-side routes resolve.
pub fn router(state: Arc<ServerState>, static_dir: &Path) -> Router {
    let client = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route(paths::MEMO, get(routes::list_memos).post(routes::save_memo))
        .route(paths::MEMO_ITEM, get(routes::get_memo).delete(routes::delete_memo))
        .route(paths::RSS_FETCH, post(routes::fetch_feed))
        .route(paths::HEALTH, get(routes::health))
        .fallback_service(client)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the configured address and serve until `shutdown` resolves
pub async fn serve<F>(config: &AppConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.listen_addr()).await?;
    serve_on(listener, config, shutdown).await
}

/// Serve on an already bound listener
pub async fn serve_on<F>(listener: TcpListener, config: &AppConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(ServerState::new(config)?);
    tracing::info!("MemoFee server listening on http://{}", listener.local_addr()?);
    tracing::info!("Memos stored in {}", state.memos.path().display());

    let app = router(state, &config.server.static_dir);

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    tracing::info!("MemoFee server stopped");
    Ok(())
}
