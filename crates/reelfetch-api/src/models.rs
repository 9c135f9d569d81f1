//! Wire DTOs for the HTTP surface.
//!
//! Request bodies keep every field optional so missing input is reported as
//! a problem document naming the field instead of a decoder rejection.

use serde::{Deserialize, Serialize};

/// RFC9457-compatible problem document surfaced on errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    /// URI reference identifying the problem type.
    pub kind: String,
    /// Short, human-readable summary of the issue.
    pub title: String,
    /// HTTP status code associated with the error.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Detailed diagnostic message when available.
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Parameters that failed validation, if applicable.
    pub invalid_params: Option<Vec<ProblemInvalidParam>>,
}

/// Invalid parameter pointer surfaced alongside a [`ProblemDetails`] payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemInvalidParam {
    /// JSON Pointer to the offending field.
    pub pointer: String,
    /// Human-readable description of the validation failure.
    pub message: String,
}

/// `POST /download` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    /// Source URL.
    pub url: Option<String>,
    /// Optional destination name.
    pub filename: Option<String>,
}

/// `POST /torrent/download` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentRequest {
    /// Magnet URI or torrent file link.
    pub magnet_link: Option<String>,
    /// Display title used to rename the torrent.
    pub title: Option<String>,
}

/// `POST /search` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Free-text query.
    pub query: Option<String>,
    /// `all`, `movies`, or `tv`.
    pub content_type: Option<String>,
}

/// Response of `DELETE /downloads/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancelResponse {
    /// Always `true`; failures are problem documents.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Response of `GET /jellyfin/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleStatus {
    /// Whether the integration is configured.
    pub enabled: bool,
}

/// Response of `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    /// Library refresh available.
    pub jellyfin: bool,
    /// Torrent delegation available.
    pub qbittorrent: bool,
    /// Indexer search available.
    pub jackett: bool,
    /// Destination folder for direct downloads.
    pub download_folder: String,
    /// Simultaneous direct-download ceiling.
    pub max_concurrent_downloads: usize,
    /// Direct downloads still in progress.
    pub active_downloads: usize,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Build identifier.
    pub build: String,
}
