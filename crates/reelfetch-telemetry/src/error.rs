//! Error types for telemetry operations.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::string::FromUtf8Error;

use prometheus::Error as PrometheusError;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Step of the collector lifecycle that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorStage {
    /// Building the collector from its options.
    Build,
    /// Adding the collector to the registry.
    Register,
}

impl CollectorStage {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Register => "register",
        }
    }
}

/// Errors raised while setting up logging or serving metrics.
#[derive(Debug)]
pub enum TelemetryError {
    /// A global subscriber is already set or could not be installed.
    Subscriber {
        /// Underlying subscriber error.
        source: TryInitError,
    },
    /// A Prometheus collector could not be built or registered.
    Collector {
        /// Metric name.
        metric: &'static str,
        /// Lifecycle step that failed.
        stage: CollectorStage,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The text exposition could not be produced.
    Exposition {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The text exposition was not UTF-8.
    ExpositionEncoding {
        /// Underlying conversion error.
        source: FromUtf8Error,
    },
}

impl TelemetryError {
    pub(crate) const fn build(metric: &'static str, source: PrometheusError) -> Self {
        Self::Collector {
            metric,
            stage: CollectorStage::Build,
            source,
        }
    }

    pub(crate) const fn register(metric: &'static str, source: PrometheusError) -> Self {
        Self::Collector {
            metric,
            stage: CollectorStage::Register,
            source,
        }
    }
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Subscriber { .. } => "tracing subscriber could not be installed",
            Self::Collector {
                stage: CollectorStage::Build,
                ..
            } => "metrics collector could not be built",
            Self::Collector {
                stage: CollectorStage::Register,
                ..
            } => "metrics collector could not be registered",
            Self::Exposition { .. } => "metrics exposition failed",
            Self::ExpositionEncoding { .. } => "metrics exposition was not utf-8",
        };
        formatter.write_str(message)
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Subscriber { source } => Some(source),
            Self::Collector { source, .. } | Self::Exposition { source } => Some(source),
            Self::ExpositionEncoding { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_stage_selects_message() {
        let built = TelemetryError::build("active_transfers", PrometheusError::Msg("x".into()));
        let registered =
            TelemetryError::register("active_transfers", PrometheusError::Msg("x".into()));
        assert_eq!(built.to_string(), "metrics collector could not be built");
        assert_eq!(registered.to_string(), "metrics collector could not be registered");
        assert!(matches!(
            registered,
            TelemetryError::Collector {
                metric: "active_transfers",
                stage: CollectorStage::Register,
                ..
            }
        ));
        assert_eq!(CollectorStage::Build.as_str(), "build");
    }

    #[test]
    fn exposition_errors_expose_their_source() {
        let Err(source) = String::from_utf8(vec![0, 159]) else {
            panic!("bytes should be rejected");
        };
        let err = TelemetryError::ExpositionEncoding { source };
        assert_eq!(err.to_string(), "metrics exposition was not utf-8");
        assert!(err.source().is_some());
    }
}
