//! HTTP surface modules (router, handlers, middleware).

/// Shared constants and header names.
pub mod constants;
/// Direct download handlers.
pub(crate) mod downloads;
/// Problem response helpers.
pub(crate) mod errors;
/// Health, status, and metrics endpoints.
pub(crate) mod health;
/// Torrent, search, and library handlers.
pub(crate) mod integrations;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub(crate) mod telemetry;
