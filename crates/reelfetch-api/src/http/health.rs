//! Health, integration status, and metrics endpoints.

use std::sync::Arc;

use axum::{Json, extract::State, http::header::CONTENT_TYPE, response::IntoResponse};
use reelfetch_core::TransferInspector;
use reelfetch_telemetry::build_sha;
use tracing::error;

use crate::http::errors::ApiError;
use crate::models::{HealthResponse, IntegrationStatus};
use crate::state::ApiState;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        build: build_sha().to_string(),
    })
}

pub(crate) async fn status(State(state): State<Arc<ApiState>>) -> Json<IntegrationStatus> {
    let transfers = state.transfers.config();
    Json(IntegrationStatus {
        jellyfin: state.library.is_enabled(),
        qbittorrent: state.remote.is_available(),
        jackett: state.search.is_enabled(),
        download_folder: transfers.download_dir.display().to_string(),
        max_concurrent_downloads: transfers.max_concurrent,
        active_downloads: state.transfers.active_count(),
    })
}

pub(crate) async fn metrics(
    State(state): State<Arc<ApiState>>,
) -> Result<impl IntoResponse, ApiError> {
    let body = state.telemetry.render().map_err(|err| {
        error!(error = %err, "metrics exposition failed");
        ApiError::internal("metrics could not be rendered")
    })?;
    Ok(([(CONTENT_TYPE, PROMETHEUS_TEXT)], body))
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::not_found("no route matches the request")
}
