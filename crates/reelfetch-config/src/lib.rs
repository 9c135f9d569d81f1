#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! File- and environment-backed configuration for Reelfetch.
//!
//! Layout: `model.rs` (typed sections and defaults), `loader.rs` (JSON file
//! plus environment overrides), `validate.rs` (field checks), `error.rs`.

pub mod error;
pub mod loader;
pub mod model;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, ConfigLoader};
pub use model::{
    AppConfig, JackettConfig, JellyfinConfig, LoggingSettings, QbittorrentConfig, ServerConfig,
    TransfersConfig,
};
