//! Shared state handed to every handler.

use std::sync::Arc;

use reelfetch_core::{LibraryScanner, RemoteJobs, SearchProvider, StatusAggregator};
use reelfetch_telemetry::Metrics;
use reelfetch_transfer::TransferEngine;

/// Services the HTTP surface routes requests to.
#[derive(Clone)]
pub struct ApiServices {
    /// Direct download engine.
    pub transfers: TransferEngine,
    /// Torrent daemon adapter.
    pub remote: Arc<dyn RemoteJobs>,
    /// Media server adapter.
    pub library: Arc<dyn LibraryScanner>,
    /// Indexer adapter.
    pub search: Arc<dyn SearchProvider>,
}

pub(crate) struct ApiState {
    pub(crate) transfers: TransferEngine,
    pub(crate) remote: Arc<dyn RemoteJobs>,
    pub(crate) library: Arc<dyn LibraryScanner>,
    pub(crate) search: Arc<dyn SearchProvider>,
    pub(crate) jobs: StatusAggregator,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    pub(crate) fn new(services: ApiServices, telemetry: Metrics) -> Self {
        let jobs = StatusAggregator::new(
            Arc::new(services.transfers.clone()),
            Arc::clone(&services.remote),
        );
        Self {
            transfers: services.transfers,
            remote: services.remote,
            library: services.library,
            search: services.search,
            jobs,
            telemetry,
        }
    }
}
