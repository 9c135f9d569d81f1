//! Merged polling view over direct and remote jobs.

use std::sync::Arc;

use tracing::warn;

use crate::model::{JobSnapshot, JobView};
use crate::service::{RemoteJobs, TransferInspector};

/// Combines the transfer registry with the torrent client's job list.
#[derive(Clone)]
pub struct StatusAggregator {
    transfers: Arc<dyn TransferInspector>,
    remote: Arc<dyn RemoteJobs>,
}

impl StatusAggregator {
    /// Build an aggregator over both job sources.
    #[must_use]
    pub fn new(transfers: Arc<dyn TransferInspector>, remote: Arc<dyn RemoteJobs>) -> Self {
        Self { transfers, remote }
    }

    /// Direct jobs first, then remote jobs, each in source order.
    ///
    /// A failing remote listing is logged and contributes nothing.
    pub async fn snapshots(&self) -> Vec<JobSnapshot> {
        let mut jobs: Vec<JobSnapshot> = self
            .transfers
            .list_active()
            .into_iter()
            .map(JobSnapshot::Direct)
            .collect();
        match self.remote.list_remote().await {
            Ok(remote) => jobs.extend(remote.into_iter().map(JobSnapshot::Remote)),
            Err(err) => {
                warn!(error = %err, detail = %err.detail(), "remote job listing failed");
            }
        }
        jobs
    }

    /// Display records for every job.
    pub async fn poll_all(&self) -> Vec<JobView> {
        self.snapshots()
            .await
            .iter()
            .map(JobSnapshot::view)
            .collect()
    }
}
