#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Clients for the external systems Reelfetch delegates to.
//!
//! - [`QbittorrentClient`]: session-authenticated torrent daemon (Web API v2).
//! - [`JellyfinClient`]: API-key library refresh.
//! - [`JackettClient`]: API-key indexer search.

mod http;
pub mod jackett;
pub mod jellyfin;
pub mod qbittorrent;

pub use jackett::{JackettClient, JackettSettings};
pub use jellyfin::{JellyfinClient, JellyfinSettings};
pub use qbittorrent::{QbittorrentClient, QbittorrentSettings};
