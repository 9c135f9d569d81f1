//! Job, search, and display DTOs shared across crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FetchError;

/// Lifecycle of a direct transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// Registered, no response received yet.
    Starting,
    /// Body is streaming to disk.
    Downloading,
    /// All bytes written.
    Completed,
    /// Aborted by an error.
    Failed,
    /// Aborted by the caller.
    Cancelled,
}

impl TransferState {
    /// Whether the transfer no longer occupies a concurrency slot.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Bytes received so far and the expected total when the source declared one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProgress {
    /// Bytes written to disk.
    pub downloaded: u64,
    /// Declared content length, if known and positive.
    pub total: Option<u64>,
}

impl TransferProgress {
    /// Rounded completion percentage; `0` while the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentage(&self) -> u8 {
        match self.total {
            Some(total) if total > 0 => {
                let ratio = (self.downloaded as f64 / total as f64) * 100.0;
                ratio.round().clamp(0.0, 100.0) as u8
            }
            _ => 0,
        }
    }
}

/// Point-in-time copy of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSnapshot {
    /// Engine-assigned identifier.
    pub id: Uuid,
    /// Source URL as submitted.
    pub url: String,
    /// Destination filename within the download folder.
    pub filename: String,
    /// Lifecycle state.
    pub state: TransferState,
    /// Human-readable status line.
    #[serde(rename = "status")]
    pub status_text: String,
    /// Rounded completion percentage.
    #[serde(rename = "progress")]
    pub percentage: u8,
    /// Bytes received so far.
    pub downloaded_bytes: u64,
    /// Declared size, when known.
    pub total_bytes: Option<u64>,
    /// Failure detail for failed transfers.
    pub error: Option<String>,
    /// Submission time.
    pub started_at: DateTime<Utc>,
}

/// Acknowledgement returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTicket {
    /// Identifier of the new transfer.
    pub id: Uuid,
    /// Filename the transfer will write.
    pub filename: String,
    /// Human-readable acknowledgement.
    pub message: String,
}

/// Torrent-client job shaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteJob {
    /// Remote identifier (info hash).
    pub hash: String,
    /// Remote display name.
    pub name: String,
    /// Human-readable total size.
    pub size: String,
    /// Rounded completion percentage.
    pub progress: u8,
    /// Remote state label.
    pub state: String,
    /// Estimated seconds remaining as reported by the remote.
    pub eta: i64,
    /// Download rate, e.g. `1.2 MB/s`.
    pub download_speed: String,
    /// Upload rate, e.g. `12 KB/s`.
    pub upload_speed: String,
    /// Connected seeds.
    pub seeders: u64,
    /// Connected leechers.
    pub peers: u64,
}

impl RemoteJob {
    /// Composite status line, `<state> - <pct>% (<rate>)`.
    #[must_use]
    pub fn status_text(&self) -> String {
        format!(
            "{} - {}% ({})",
            self.state, self.progress, self.download_speed
        )
    }
}

/// Outcome of handing a link to the torrent client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubmission {
    /// Whether the remote accepted the link.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Outcome of a library refresh request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    /// Whether every refresh call succeeded.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Origin of a job in the merged view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Fetched by the transfer engine.
    Direct,
    /// Delegated to the torrent client.
    Remote,
}

/// Uniform display record for any job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    /// Transfer UUID or remote hash.
    pub id: String,
    /// Display filename.
    pub filename: String,
    /// Human-readable status line.
    pub status_text: String,
    /// Rounded completion percentage.
    pub percentage: u8,
    /// Job origin.
    pub kind: JobKind,
}

/// A job from either source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSnapshot {
    /// Locally owned transfer.
    Direct(TransferSnapshot),
    /// Remote torrent job.
    Remote(RemoteJob),
}

impl JobSnapshot {
    /// Project into the shared display contract.
    #[must_use]
    pub fn view(&self) -> JobView {
        match self {
            Self::Direct(transfer) => JobView {
                id: transfer.id.to_string(),
                filename: transfer.filename.clone(),
                status_text: transfer.status_text.clone(),
                percentage: transfer.percentage,
                kind: JobKind::Direct,
            },
            Self::Remote(job) => JobView {
                id: job.hash.clone(),
                filename: job.name.clone(),
                status_text: job.status_text(),
                percentage: job.progress,
                kind: JobKind::Remote,
            },
        }
    }
}

/// Search scope accepted by the indexer aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// No category filter.
    #[default]
    All,
    /// Movies only.
    Movies,
    /// Television only.
    Tv,
}

impl ContentType {
    /// Indexer category code; empty for [`ContentType::All`].
    #[must_use]
    pub const fn category_code(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Movies => "2000",
            Self::Tv => "5000",
        }
    }

    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Movies => "movies",
            Self::Tv => "tv",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "movies" | "movie" => Ok(Self::Movies),
            "tv" => Ok(Self::Tv),
            other => Err(FetchError::invalid_value(
                "contentType",
                "must be one of all, movies, tv",
                other,
            )),
        }
    }
}

/// One indexer hit shaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Release title.
    pub title: String,
    /// Human-readable size or `Unknown`.
    pub size: String,
    /// Detected quality tag or `Unknown`.
    pub quality: String,
    /// Seed count.
    pub seeders: u64,
    /// Peer count.
    pub peers: u64,
    /// Category label reported by the indexer.
    pub category: Option<String>,
    /// Indexer (tracker) name.
    pub indexer: String,
    /// Magnet URI when available.
    pub magnet_link: Option<String>,
    /// Torrent file link when available.
    pub download_link: Option<String>,
    /// Publish date as reported.
    pub publish_date: Option<String>,
    /// IMDb identifier when known.
    pub imdb_id: Option<String>,
}

/// Search results with the echoed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Query as submitted.
    pub query: String,
    /// Scope used.
    pub content_type: ContentType,
    /// Ranked results.
    pub results: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(progress: TransferProgress) -> TransferSnapshot {
        TransferSnapshot {
            id: Uuid::nil(),
            url: "https://cdn.test/video.mp4".to_string(),
            filename: "video.mp4".to_string(),
            state: TransferState::Downloading,
            status_text: "Downloading... 50%".to_string(),
            percentage: progress.percentage(),
            downloaded_bytes: progress.downloaded,
            total_bytes: progress.total,
            error: None,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_is_rounded_and_zero_without_total() {
        let half = TransferProgress {
            downloaded: 5,
            total: Some(10),
        };
        assert_eq!(half.percentage(), 50);
        let third = TransferProgress {
            downloaded: 2,
            total: Some(3),
        };
        assert_eq!(third.percentage(), 67);
        let unknown = TransferProgress {
            downloaded: 99,
            total: None,
        };
        assert_eq!(unknown.percentage(), 0);
        let zero_total = TransferProgress {
            downloaded: 1,
            total: Some(0),
        };
        assert_eq!(zero_total.percentage(), 0);
    }

    #[test]
    fn terminal_states_release_slots() {
        assert!(!TransferState::Starting.is_terminal());
        assert!(!TransferState::Downloading.is_terminal());
        assert!(TransferState::Completed.is_terminal());
        assert!(TransferState::Failed.is_terminal());
        assert!(TransferState::Cancelled.is_terminal());
    }

    #[test]
    fn views_share_one_shape() {
        let direct = JobSnapshot::Direct(transfer(TransferProgress {
            downloaded: 1,
            total: Some(2),
        }))
        .view();
        assert_eq!(direct.kind, JobKind::Direct);
        assert_eq!(direct.percentage, 50);
        assert_eq!(direct.filename, "video.mp4");

        let remote = JobSnapshot::Remote(RemoteJob {
            hash: "abc".to_string(),
            name: "Show S01".to_string(),
            size: "1.4 GB".to_string(),
            progress: 42,
            state: "downloading".to_string(),
            eta: 60,
            download_speed: "1.2 MB/s".to_string(),
            upload_speed: "0 B/s".to_string(),
            seeders: 10,
            peers: 2,
        })
        .view();
        assert_eq!(remote.kind, JobKind::Remote);
        assert_eq!(remote.status_text, "downloading - 42% (1.2 MB/s)");
        assert_eq!(remote.id, "abc");
    }

    #[test]
    fn content_type_parses_and_maps_categories() {
        assert_eq!("movies".parse::<ContentType>().ok(), Some(ContentType::Movies));
        assert_eq!("TV".parse::<ContentType>().ok(), Some(ContentType::Tv));
        assert_eq!("".parse::<ContentType>().ok(), Some(ContentType::All));
        assert!("books".parse::<ContentType>().is_err());
        assert_eq!(ContentType::Movies.category_code(), "2000");
        assert_eq!(ContentType::Tv.category_code(), "5000");
        assert_eq!(ContentType::All.category_code(), "");
    }

    #[test]
    fn snapshot_serialises_with_wire_names() {
        let snapshot = transfer(TransferProgress::default());
        let value = serde_json::to_value(&snapshot).expect("serialises");
        assert_eq!(value["status"], "Downloading... 50%");
        assert_eq!(value["progress"], 0);
        assert_eq!(value["state"], "downloading");
        assert!(value.get("downloadedBytes").is_some());
    }
}
