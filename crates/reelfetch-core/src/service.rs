//! Traits implemented by the transfer engine and the remote adapters.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::model::{
    ContentType, RefreshOutcome, RemoteJob, RemoteSubmission, SearchResponse, TransferSnapshot,
};

/// Read-only view over locally owned transfers.
pub trait TransferInspector: Send + Sync {
    /// Consistent snapshot of the registry in submission order.
    fn list_active(&self) -> Vec<TransferSnapshot>;
}

/// Jobs whose progress lives in a remote system.
#[async_trait]
pub trait RemoteJobs: Send + Sync {
    /// Whether the adapter has the configuration it needs.
    fn is_available(&self) -> bool;

    /// Hand a link to the remote system.
    async fn submit_remote(&self, link: &str, title: &str) -> FetchResult<RemoteSubmission>;

    /// Current remote jobs; empty when the adapter is unavailable.
    async fn list_remote(&self) -> FetchResult<Vec<RemoteJob>>;
}

/// Media-server library rescans.
#[async_trait]
pub trait LibraryScanner: Send + Sync {
    /// Whether the scanner has the configuration it needs.
    fn is_enabled(&self) -> bool;

    /// Ask the media server to rescan its libraries.
    async fn refresh_library(&self) -> FetchResult<RefreshOutcome>;
}

/// Indexer search.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Whether the provider has the configuration it needs.
    fn is_enabled(&self) -> bool;

    /// Run a query across all configured indexers.
    async fn search(&self, query: &str, content_type: ContentType) -> FetchResult<SearchResponse>;
}
