//! Error taxonomy shared by the transfer engine and the remote adapters.
//!
//! # Design
//! - Display strings stay constant; context lives in structured fields.
//! - [`FetchError::detail`] renders the human-readable text surfaced in job
//!   status lines and API problem documents.
//! - [`FetchError::kind`] gives transports a coarse category to map onto
//!   status codes without matching every variant.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied something unusable.
    InvalidInput,
    /// The concurrency ceiling is reached.
    CapacityExceeded,
    /// A required integration is not configured.
    Configuration,
    /// A remote system answered with a failure.
    Upstream,
    /// A remote system did not answer in time.
    Timeout,
    /// Local filesystem failure.
    Io,
}

/// Errors raised by fetch, transfer, and adapter operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Caller input failed validation.
    #[error("invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Human-readable reason.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// No transfer slot is free.
    #[error("transfer capacity exceeded")]
    CapacityExceeded {
        /// Configured ceiling.
        limit: usize,
    },
    /// Integration is missing the settings it needs.
    #[error("integration not configured")]
    Configuration {
        /// Integration name.
        service: &'static str,
    },
    /// Remote system rejected or failed the request.
    #[error("upstream request failed")]
    Upstream {
        /// Remote system name.
        service: &'static str,
        /// HTTP status when the failure came from a response.
        status: Option<u16>,
        /// Remote or transport message.
        message: String,
    },
    /// Remote system did not respond within the deadline.
    #[error("upstream request timed out")]
    Timeout {
        /// Remote system name.
        service: &'static str,
        /// Deadline that elapsed.
        after: Duration,
    },
    /// Filesystem operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: Option<PathBuf>,
        /// Source IO error.
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    /// Build an [`FetchError::InvalidInput`] without a captured value.
    #[must_use]
    pub const fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidInput {
            field,
            reason,
            value: None,
        }
    }

    /// Build an [`FetchError::InvalidInput`] carrying the offending value.
    #[must_use]
    pub fn invalid_value(field: &'static str, reason: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason,
            value: Some(value.into()),
        }
    }

    /// Build an [`FetchError::Upstream`] failure for an HTTP status.
    #[must_use]
    pub fn upstream_status(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build an [`FetchError::Upstream`] failure without a response status.
    #[must_use]
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            status: None,
            message: message.into(),
        }
    }

    /// Build an [`FetchError::Io`] failure.
    #[must_use]
    pub const fn io(operation: &'static str, path: Option<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path,
            source,
        }
    }

    /// Coarse kind used by transports to choose a status code.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Name of the remote system involved, if any.
    #[must_use]
    pub const fn service(&self) -> Option<&'static str> {
        match self {
            Self::Configuration { service }
            | Self::Upstream { service, .. }
            | Self::Timeout { service, .. } => Some(*service),
            _ => None,
        }
    }

    /// Human-readable description for status lines and problem documents.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidInput { field, reason, .. } => format!("{field} {reason}"),
            Self::CapacityExceeded { limit } => {
                format!("Maximum concurrent downloads reached ({limit})")
            }
            Self::Configuration { service } => format!("{service} is not configured"),
            Self::Upstream {
                status: Some(status),
                message,
                ..
            } => format!("HTTP {status}: {message}"),
            Self::Upstream { message, .. } => message.clone(),
            Self::Timeout { service, after } => {
                format!("{service} request timed out after {}ms", after.as_millis())
            }
            Self::Io {
                operation, source, ..
            } => format!("{operation}: {source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_renders_http_failures_like_status_lines() {
        let err = FetchError::upstream_status("source", 404, "Not Found");
        assert_eq!(err.detail(), "HTTP 404: Not Found");
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.service(), Some("source"));
        assert_eq!(err.to_string(), "upstream request failed");
    }

    #[test]
    fn capacity_detail_names_the_ceiling() {
        let err = FetchError::CapacityExceeded { limit: 3 };
        assert_eq!(err.detail(), "Maximum concurrent downloads reached (3)");
        assert!(err.service().is_none());
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err = FetchError::io(
            "create destination file",
            Some(PathBuf::from("/tmp/x")),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.detail(), "create destination file: denied");
    }

    #[test]
    fn invalid_input_detail_joins_field_and_reason() {
        let err = FetchError::invalid("url", "is required");
        assert_eq!(err.detail(), "url is required");
        let err = FetchError::invalid_value("contentType", "is not recognised", "books");
        assert!(matches!(
            err,
            FetchError::InvalidInput { value: Some(ref v), .. } if v == "books"
        ));
    }
}
