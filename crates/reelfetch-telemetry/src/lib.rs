#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Telemetry primitives shared across the Reelfetch workspace.
//!
//! Logging setup, the Prometheus registry, the process-wide span guard, and
//! request-id layers live here so every crate reports the same way.

pub mod context;
pub mod error;
pub mod init;
pub mod layers;
pub mod metrics;

pub use context::GlobalContextGuard;
pub use error::{CollectorStage, Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use layers::{propagate_request_id_layer, set_request_id_layer};
pub use metrics::Metrics;
