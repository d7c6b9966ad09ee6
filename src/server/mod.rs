mod handlers;

use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::app::App;
use crate::error::Result;

pub fn router(app: Arc<App>) -> Router {
    // Called straight from the browser, so any origin is allowed
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/translate-content", post(handlers::translate_content))
        .route("/process-translation-queue", post(handlers::process_translation_queue))
        .route(
            "/auto-process-translation-queue",
            post(handlers::auto_process_translation_queue),
        )
        .route("/trigger-queue-processing", post(handlers::trigger_queue_processing))
        .route("/bulk-translate-content", post(handlers::bulk_translate_content))
        .route("/translation-queue/stats", get(handlers::queue_stats))
        .layer(cors)
        .with_state(app)
}

pub async fn serve(app: Arc<App>, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Translation API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(app)).await?;
    Ok(())
}
