#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Shared job model, naming rules, and service traits for Reelfetch.
//!
//! Layout: `error.rs` (fetch error taxonomy), `naming.rs` (filename and byte
//! formatting helpers), `model.rs` (job and search DTOs), `service.rs`
//! (traits implemented by the transfer engine and remote adapters),
//! `status.rs` (merged polling view).

pub mod error;
pub mod model;
pub mod naming;
pub mod service;
pub mod status;

pub use error::{ErrorKind, FetchError, FetchResult};
pub use model::{
    ContentType, JobKind, JobSnapshot, JobView, RefreshOutcome, RemoteJob, RemoteSubmission,
    SearchResponse, SearchResult, TransferProgress, TransferSnapshot, TransferState,
    TransferTicket,
};
pub use service::{LibraryScanner, RemoteJobs, SearchProvider, TransferInspector};
pub use status::StatusAggregator;
