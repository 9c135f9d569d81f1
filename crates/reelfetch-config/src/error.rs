//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid JSON for [`crate::AppConfig`].
    #[error("failed to parse configuration file")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        section: &'static str,
        field: &'static str,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section,
            field,
            value,
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
