//! Torrent delegation, indexer search, and library refresh handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use reelfetch_core::{
    ContentType, FetchError, RefreshOutcome, RemoteJob, RemoteSubmission, SearchResponse,
};
use tracing::{info, warn};

use crate::http::errors::ApiError;
use crate::models::{SearchRequest, ToggleStatus, TorrentRequest};
use crate::state::ApiState;

pub(crate) async fn submit_torrent(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<TorrentRequest>, JsonRejection>,
) -> Result<Json<RemoteSubmission>, ApiError> {
    let Json(request) = body?;
    let link = request.magnet_link.unwrap_or_default();
    let title = request.title.unwrap_or_default();

    match state.remote.submit_remote(&link, &title).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(err) => {
            warn!(title = %title, error = %err, detail = %err.detail(), "torrent submission failed");
            Err(err.into())
        }
    }
}

pub(crate) async fn list_torrents(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<RemoteJob>>, ApiError> {
    state.remote.list_remote().await.map(Json).map_err(|err| {
        warn!(error = %err, detail = %err.detail(), "torrent listing failed");
        err.into()
    })
}

pub(crate) async fn search(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = body?;
    let content_type = request
        .content_type
        .as_deref()
        .map_or(Ok(ContentType::All), str::parse::<ContentType>)?;
    let query = request.query.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(FetchError::invalid("query", "is required").into());
    }

    let response = state.search.search(&query, content_type).await.map_err(|err| {
        warn!(query = %query, error = %err, detail = %err.detail(), "search failed");
        ApiError::from(err)
    })?;
    info!(query = %query, results = response.results.len(), "search served");
    Ok(Json(response))
}

pub(crate) async fn refresh_library(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<RefreshOutcome>, ApiError> {
    state.library.refresh_library().await.map(Json).map_err(|err| {
        warn!(error = %err, detail = %err.detail(), "library refresh failed");
        err.into()
    })
}

pub(crate) async fn library_status(State(state): State<Arc<ApiState>>) -> Json<ToggleStatus> {
    Json(ToggleStatus {
        enabled: state.library.is_enabled(),
    })
}
