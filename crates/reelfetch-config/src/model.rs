//! Typed configuration sections.
//!
//! # Design
//! - Every section has a complete default so an absent file is a valid setup.
//! - Integration sections keep secrets optional; a missing secret disables the
//!   integration rather than failing startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default HTTP listener port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default destination folder for direct downloads.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
/// Default simultaneous direct-download ceiling.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;
/// Default category applied to delegated torrents.
pub const DEFAULT_TORRENT_CATEGORY: &str = "reelfetch";

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Direct download engine.
    pub transfers: TransfersConfig,
    /// Media server integration.
    pub jellyfin: JellyfinConfig,
    /// Torrent daemon integration.
    pub qbittorrent: QbittorrentConfig,
    /// Indexer search integration.
    pub jackett: JackettConfig,
    /// Log output.
    pub logging: LoggingSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind: IpAddr,
    /// TCP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Socket address for the listener.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Direct download engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransfersConfig {
    /// Destination folder, created on startup.
    pub download_dir: PathBuf,
    /// Simultaneous transfer ceiling.
    pub max_concurrent: usize,
    /// Seconds a source may stay silent before the transfer fails.
    pub idle_timeout_secs: u64,
    /// Seconds failed or cancelled transfers stay visible.
    pub failure_grace_secs: u64,
    /// Seconds completed transfers stay visible; zero removes them at once.
    pub completed_retention_secs: u64,
    /// Redirect hops followed before giving up.
    pub max_redirects: usize,
}

impl Default for TransfersConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            idle_timeout_secs: 30,
            failure_grace_secs: 30,
            completed_retention_secs: 0,
            max_redirects: 10,
        }
    }
}

impl TransfersConfig {
    /// Idle timeout as a [`Duration`].
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Failure grace period as a [`Duration`].
    #[must_use]
    pub const fn failure_grace(&self) -> Duration {
        Duration::from_secs(self.failure_grace_secs)
    }

    /// Completed retention as a [`Duration`].
    #[must_use]
    pub const fn completed_retention(&self) -> Duration {
        Duration::from_secs(self.completed_retention_secs)
    }
}

/// Jellyfin settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JellyfinConfig {
    /// Server base URL.
    pub url: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Libraries refreshed individually; all libraries when empty.
    pub library_ids: Vec<String>,
}

impl JellyfinConfig {
    /// Whether both URL and key are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        filled(self.url.as_deref()) && filled(self.api_key.as_deref())
    }
}

/// qBittorrent settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QbittorrentConfig {
    /// Web UI base URL.
    pub url: Option<String>,
    /// Web UI username.
    pub username: Option<String>,
    /// Web UI password.
    pub password: Option<String>,
    /// Save path handed to the daemon.
    pub download_path: Option<String>,
    /// Category applied to added torrents.
    pub category: String,
}

impl Default for QbittorrentConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            download_path: None,
            category: DEFAULT_TORRENT_CATEGORY.to_string(),
        }
    }
}

impl QbittorrentConfig {
    /// Whether URL and both credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        filled(self.url.as_deref())
            && filled(self.username.as_deref())
            && filled(self.password.as_deref())
    }
}

/// Jackett settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JackettConfig {
    /// Jackett base URL.
    pub url: Option<String>,
    /// API key.
    pub api_key: Option<String>,
}

impl JackettConfig {
    /// Whether both URL and key are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        filled(self.url.as_deref()) && filled(self.api_key.as_deref())
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// `json` or `pretty`; inferred from the build profile when absent.
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
        }
    }
}

fn filled(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}
