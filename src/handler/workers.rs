use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};

use crate::{
    dtos::{partydtos::WorkerSearchQuery, ApiResponse},
    error::HttpError,
    AppState,
};

pub fn worker_handler() -> Router {
    Router::new()
        .route("/search", get(search_workers))
        .route("/:worker_id", get(get_worker))
        .route("/:worker_id/stats", get(get_worker_stats))
}

pub async fn search_workers(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<WorkerSearchQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let workers = app_state
        .directory_service
        .search(&params.q, params.service_type)
        .await?;

    Ok(Json(ApiResponse::success(
        &format!("Found {} workers", workers.len()),
        workers,
    )))
}

pub async fn get_worker(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(worker_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let worker = app_state.directory_service.get_worker(&worker_id).await?;

    Ok(Json(ApiResponse::success("Worker retrieved", worker)))
}

pub async fn get_worker_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(worker_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.directory_service.get_worker(&worker_id).await?;
    let stats = app_state.booking_service.worker_stats(&worker_id).await?;

    Ok(Json(ApiResponse::success("Worker stats retrieved", stats)))
}
