#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Binary entrypoint that wires the Reelfetch services together and serves
//! the HTTP API.

use reelfetch_app::{AppResult, run_app};

/// Bootstraps Reelfetch and blocks until shutdown.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
