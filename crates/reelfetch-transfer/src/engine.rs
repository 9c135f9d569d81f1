//! Admission, lifecycle bookkeeping, and cancellation for direct transfers.
//!
//! # Design
//! - The registry mutex is only held for short synchronous sections; the
//!   ceiling check, filename reservation, and insertion share one section.
//! - Each transfer runs on its own task with a child of the engine's
//!   shutdown token, so one `cancel` or a global shutdown reaches it.
//! - Failed and cancelled entries stay listed for the grace period; completed
//!   entries follow the retention setting.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use reelfetch_core::naming::{format_bytes, resolve_filename, unique_filename, unix_millis};
use reelfetch_core::{
    FetchError, FetchResult, TransferInspector, TransferSnapshot, TransferState, TransferTicket,
};
use reelfetch_telemetry::Metrics;
use reqwest::{Client, redirect::Policy};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::TransferConfig;
use crate::fetch::{FetchRequest, Halt};
use crate::registry::{
    CANCELLED_STATUS, Registry, STARTING_STATUS, TransferEntry, apply_progress, completed_status,
    failed_status,
};

const USER_AGENT: &str = concat!("reelfetch/", env!("CARGO_PKG_VERSION"));

/// Runs direct HTTP downloads into the configured folder.
#[derive(Clone)]
pub struct TransferEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: TransferConfig,
    client: Client,
    registry: Mutex<Registry>,
    shutdown: CancellationToken,
    tasks: TaskTracker,
    metrics: Metrics,
}

struct Job {
    id: Uuid,
    url: Url,
    path: PathBuf,
    token: CancellationToken,
}

impl TransferEngine {
    /// Build an engine, creating the download folder when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the folder cannot be created or the HTTP client
    /// cannot be built.
    pub fn new(config: TransferConfig, metrics: Metrics) -> FetchResult<Self> {
        std::fs::create_dir_all(&config.download_dir).map_err(|err| {
            FetchError::io(
                "create download folder",
                Some(config.download_dir.clone()),
                err,
            )
        })?;
        let client = Client::builder()
            .redirect(Policy::none())
            .connect_timeout(config.idle_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| FetchError::upstream("http client", err.to_string()))?;

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                client,
                registry: Mutex::new(Registry::default()),
                shutdown: CancellationToken::new(),
                tasks: TaskTracker::new(),
                metrics,
            }),
        })
    }

    /// Settings the engine runs with.
    #[must_use]
    pub fn config(&self) -> &TransferConfig {
        &self.inner.config
    }

    /// Transfers still occupying a slot; finished entries that linger in the
    /// registry are not counted.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.lock_registry().active_count()
    }

    /// Whether another transfer would currently be admitted.
    #[must_use]
    pub fn can_admit(&self) -> bool {
        self.inner.lock_registry().active_count() < self.inner.config.max_concurrent
    }

    /// Validate, reserve a filename, register, and start a transfer.
    ///
    /// Returns as soon as the job is registered; the download continues on a
    /// background task.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidInput`] for a missing or non-http(s) URL.
    /// - [`FetchError::CapacityExceeded`] when every slot is taken.
    pub fn submit(&self, url: &str, custom_name: Option<&str>) -> FetchResult<TransferTicket> {
        let url = parse_source_url(url)?;
        let requested = resolve_filename(&url, custom_name);
        let download_dir = &self.inner.config.download_dir;

        let job = {
            let mut registry = self.inner.lock_registry();
            let limit = self.inner.config.max_concurrent;
            if registry.active_count() >= limit {
                return Err(FetchError::CapacityExceeded { limit });
            }
            let filename = unique_filename(&requested, unix_millis(), |candidate| {
                registry.is_reserved(candidate) || download_dir.join(candidate).exists()
            });
            let job = Job {
                id: Uuid::new_v4(),
                path: download_dir.join(&filename),
                token: self.inner.shutdown.child_token(),
                url,
            };
            registry.insert(TransferEntry {
                snapshot: TransferSnapshot {
                    id: job.id,
                    url: job.url.to_string(),
                    filename,
                    state: TransferState::Starting,
                    status_text: STARTING_STATUS.to_string(),
                    percentage: 0,
                    downloaded_bytes: 0,
                    total_bytes: None,
                    error: None,
                    started_at: Utc::now(),
                },
                token: job.token.clone(),
            });
            self.inner.publish_active(&registry);
            job
        };

        let filename = file_name_of(&job.path);
        info!(transfer_id = %job.id, url = %job.url, filename = %filename, "transfer admitted");
        self.inner.metrics.inc_transfer_started();

        let ticket = TransferTicket {
            id: job.id,
            message: format!("Download started: {filename}"),
            filename,
        };
        let inner = Arc::clone(&self.inner);
        self.inner.tasks.spawn(async move { inner.run(job).await });
        Ok(ticket)
    }

    /// Snapshot of one transfer.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<TransferSnapshot> {
        self.inner
            .lock_registry()
            .get(id)
            .map(|entry| entry.snapshot.clone())
    }

    /// Ask a running transfer to stop; its partial file is removed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] when `id` is unknown or already
    /// finished.
    pub fn cancel(&self, id: Uuid) -> FetchResult<()> {
        let registry = self.inner.lock_registry();
        let entry = registry
            .get(id)
            .ok_or_else(|| FetchError::invalid_value("id", "does not match a transfer", id.to_string()))?;
        if entry.snapshot.state.is_terminal() {
            return Err(FetchError::invalid_value(
                "id",
                "refers to a finished transfer",
                id.to_string(),
            ));
        }
        entry.token.cancel();
        info!(transfer_id = %id, "transfer cancellation requested");
        Ok(())
    }

    /// Cancel every transfer and wait for their tasks to wind down.
    pub async fn shutdown(&self) {
        let in_flight = self.inner.lock_registry().active_count();
        debug!(in_flight, "cancelling transfers for shutdown");
        self.inner.shutdown.cancel();
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
    }
}

impl TransferInspector for TransferEngine {
    fn list_active(&self) -> Vec<TransferSnapshot> {
        self.inner.lock_registry().snapshots()
    }
}

impl EngineInner {
    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_active(&self, registry: &Registry) {
        self.metrics
            .set_active_transfers(i64::try_from(registry.active_count()).unwrap_or(i64::MAX));
    }

    async fn run(self: Arc<Self>, job: Job) {
        let request = FetchRequest {
            client: &self.client,
            token: &job.token,
            idle_timeout: self.config.idle_timeout,
            max_redirects: self.config.max_redirects,
        };
        let outcome = match request.open(&job.url).await {
            Ok(response) => {
                request
                    .write_body(response, &job.path, |progress, written| {
                        self.metrics.add_transfer_bytes(written);
                        self.lock_registry()
                            .update(job.id, |snapshot| apply_progress(snapshot, progress));
                    })
                    .await
            }
            Err(halt) => Err(halt),
        };

        match outcome {
            Ok(bytes) => self.complete(&job, bytes),
            Err(Halt::Cancelled) => {
                remove_partial(&job).await;
                self.conclude(&job, TransferState::Cancelled, CANCELLED_STATUS.to_string(), None);
                self.metrics.inc_transfer_finished("cancelled");
                info!(transfer_id = %job.id, "transfer cancelled");
            }
            Err(Halt::Failed(err)) => {
                remove_partial(&job).await;
                let detail = err.detail();
                warn!(transfer_id = %job.id, url = %job.url, error = %err, detail = %detail, "transfer failed");
                self.conclude(&job, TransferState::Failed, failed_status(&detail), Some(detail));
                self.metrics.inc_transfer_finished("failed");
            }
        }
    }

    fn complete(self: &Arc<Self>, job: &Job, bytes: u64) {
        info!(
            transfer_id = %job.id,
            path = %job.path.display(),
            size = %format_bytes(bytes),
            "transfer saved"
        );
        self.metrics.inc_transfer_finished("completed");
        if self.config.completed_retention.is_zero() {
            let mut registry = self.lock_registry();
            registry.remove(job.id);
            self.publish_active(&registry);
        } else {
            self.conclude(job, TransferState::Completed, completed_status(bytes), None);
        }
    }

    /// Mark a terminal state and schedule removal of the entry.
    fn conclude(
        self: &Arc<Self>,
        job: &Job,
        state: TransferState,
        status_text: String,
        error: Option<String>,
    ) {
        {
            let mut registry = self.lock_registry();
            registry.update(job.id, |snapshot| {
                snapshot.state = state;
                snapshot.status_text = status_text;
                if state != TransferState::Completed {
                    snapshot.percentage = 0;
                }
                snapshot.error = error;
            });
            self.publish_active(&registry);
        }
        let linger = match state {
            TransferState::Completed => self.config.completed_retention,
            _ => self.config.failure_grace,
        };
        self.schedule_removal(job.id, linger);
    }

    fn schedule_removal(self: &Arc<Self>, id: Uuid, after: Duration) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if inner.lock_registry().remove(id).is_some() {
                debug!(transfer_id = %id, "transfer entry expired");
            }
        });
    }
}

fn parse_source_url(raw: &str) -> FetchResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::invalid("url", "is required"));
    }
    let url = Url::parse(trimmed)
        .map_err(|_| FetchError::invalid_value("url", "is not a valid URL", trimmed))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(FetchError::invalid_value(
            "url",
            "must be an absolute http or https URL",
            trimmed,
        )),
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn remove_partial(job: &Job) {
    match tokio::fs::remove_file(&job.path).await {
        Ok(()) => debug!(transfer_id = %job.id, path = %job.path.display(), "partial file removed"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            warn!(transfer_id = %job.id, path = %job.path.display(), error = %err, "failed to remove partial file");
        }
    }
}
