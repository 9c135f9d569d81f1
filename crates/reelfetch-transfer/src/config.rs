//! Engine tuning knobs.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of transfers allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;
/// Default deadline for connecting, receiving headers, and each body chunk.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
/// Default time a failed or cancelled entry stays visible.
pub const DEFAULT_FAILURE_GRACE: Duration = Duration::from_secs(30);
/// Default redirect hop limit.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Settings for a [`crate::TransferEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Directory receiving downloaded files.
    pub download_dir: PathBuf,
    /// Ceiling on non-terminal transfers.
    pub max_concurrent: usize,
    /// Per-step network deadline.
    pub idle_timeout: Duration,
    /// How long failed and cancelled entries remain listed.
    pub failure_grace: Duration,
    /// How long completed entries remain listed; zero removes them at once.
    pub completed_retention: Duration,
    /// Redirect hops followed before giving up.
    pub max_redirects: usize,
}

impl TransferConfig {
    /// Defaults rooted at `download_dir`.
    #[must_use]
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            failure_grace: DEFAULT_FAILURE_GRACE,
            completed_retention: Duration::ZERO,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::new("downloads")
    }
}
