//! Direct download handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use reelfetch_core::{
    FetchError, JobView, TransferInspector, TransferSnapshot, TransferTicket,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::http::errors::ApiError;
use crate::models::{CancelResponse, DownloadRequest};
use crate::state::ApiState;

pub(crate) async fn submit_download(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<TransferTicket>, ApiError> {
    let Json(request) = body?;
    if !state.transfers.can_admit() {
        let limit = state.transfers.config().max_concurrent;
        warn!(limit, "download request rejected at capacity");
        return Err(FetchError::CapacityExceeded { limit }.into());
    }
    let url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(FetchError::invalid("url", "is required"))?;

    match state.transfers.submit(url, request.filename.as_deref()) {
        Ok(ticket) => Ok(Json(ticket)),
        Err(err) => {
            warn!(url = %url, error = %err, detail = %err.detail(), "download request rejected");
            Err(err.into())
        }
    }
}

pub(crate) async fn list_downloads(
    State(state): State<Arc<ApiState>>,
) -> Json<Vec<TransferSnapshot>> {
    Json(state.transfers.list_active())
}

pub(crate) async fn cancel_download(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| FetchError::invalid_value("id", "is not a valid transfer id", id.clone()))?;
    if state.transfers.get(id).is_none() {
        return Err(ApiError::not_found(format!("transfer {id} not found")));
    }
    state.transfers.cancel(id)?;
    info!(transfer_id = %id, "download cancelled via api");
    Ok(Json(CancelResponse {
        success: true,
        message: "Download cancelled".to_string(),
    }))
}

pub(crate) async fn list_jobs(State(state): State<Arc<ApiState>>) -> Json<Vec<JobView>> {
    Json(state.jobs.poll_all().await)
}
