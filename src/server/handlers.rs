use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::error::AppError;
use crate::models::QueueStats;
use crate::services::{
    BackfillSummary, BatchSummary, DrainSummary, TranslateRequest, TranslateResponse,
};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            _ => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Translation service error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

type ApiResult<T> = std::result::Result<Json<T>, AppError>;

#[derive(Debug, Default, Deserialize)]
pub(super) struct BatchParams {
    batch_size: Option<usize>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct ProcessResponse {
    processed: usize,
    completed: usize,
    failed: usize,
}

impl From<BatchSummary> for ProcessResponse {
    fn from(summary: BatchSummary) -> Self {
        Self {
            processed: summary.total,
            completed: summary.completed,
            failed: summary.failed,
        }
    }
}

pub(super) async fn health() -> &'static str {
    "OK"
}

pub(super) async fn translate_content(
    State(app): State<Arc<App>>,
    payload: std::result::Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResult<TranslateResponse> {
    let Json(request) = payload?;
    Ok(Json(app.translate_content(request).await?))
}

pub(super) async fn process_translation_queue(
    State(app): State<Arc<App>>,
    Query(params): Query<BatchParams>,
) -> ApiResult<ProcessResponse> {
    let summary = app.process_queue(params.batch_size).await?;
    Ok(Json(summary.into()))
}

pub(super) async fn auto_process_translation_queue(
    State(app): State<Arc<App>>,
) -> ApiResult<DrainSummary> {
    Ok(Json(app.drain_queue().await?))
}

pub(super) async fn trigger_queue_processing(
    State(app): State<Arc<App>>,
) -> ApiResult<DrainSummary> {
    tracing::info!("Queue processing triggered");
    auto_process_translation_queue(State(app)).await
}

pub(super) async fn bulk_translate_content(
    State(app): State<Arc<App>>,
) -> ApiResult<BackfillSummary> {
    Ok(Json(app.backfill().await?))
}

pub(super) async fn queue_stats(State(app): State<Arc<App>>) -> ApiResult<QueueStats> {
    Ok(Json(app.queue_stats().await?))
}
