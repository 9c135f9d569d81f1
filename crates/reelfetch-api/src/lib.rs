#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! HTTP surface for Reelfetch.
//!
//! Layout: `http/router.rs` (router and server host), `http/*` handlers,
//! `http/errors.rs` (problem documents), `models.rs` (wire DTOs),
//! `state.rs` (shared handler state).

pub mod error;
pub mod http;
pub mod models;
pub(crate) mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::ApiServices;
