//! # Design
//!
//! - Centralize application-level errors for bootstrap and wiring.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: reelfetch_config::ConfigError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: reelfetch_api::ApiServerError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: reelfetch_telemetry::TelemetryError,
    },
    /// Building a transfer or integration service failed.
    #[error("service construction failed")]
    Service {
        /// Operation identifier.
        operation: &'static str,
        /// Source fetch error.
        source: reelfetch_core::FetchError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: reelfetch_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: reelfetch_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: reelfetch_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn service(
        operation: &'static str,
        source: reelfetch_core::FetchError,
    ) -> Self {
        Self::Service { operation, source }
    }
}
