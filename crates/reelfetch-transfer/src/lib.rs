#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Direct HTTP transfer engine.
//!
//! Layout: `config.rs` (tuning knobs), `registry.rs` (in-memory job table),
//! `fetch.rs` (redirect-following streaming routine), `engine.rs` (admission,
//! cancellation, and lifecycle bookkeeping).

pub mod config;
mod engine;
mod fetch;
mod registry;

pub use config::TransferConfig;
pub use engine::TransferEngine;
