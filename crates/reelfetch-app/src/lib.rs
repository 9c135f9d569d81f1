#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Reelfetch application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (configuration, logging, service wiring, shutdown),
//! `error.rs` (application error type).

/// Application bootstrap and service wiring.
pub mod bootstrap;
/// Application-level error type.
pub mod error;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
