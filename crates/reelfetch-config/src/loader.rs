//! Configuration loading: JSON file, then environment overrides, then validation.
//!
//! # Design
//! - A missing file is not an error; defaults apply.
//! - The environment is captured once into the loader so loads are
//!   deterministic and tests never mutate process state.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;
use crate::validate::validate;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "REELFETCH_CONFIG";
/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/reelfetch.json";

/// Loads [`AppConfig`] from a file and a captured environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
    env: BTreeMap<String, String>,
}

impl ConfigLoader {
    /// Loader for `path` with an empty environment.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env: BTreeMap::new(),
        }
    }

    /// Loader configured from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let env: BTreeMap<String, String> = std::env::vars().collect();
        let path = env
            .get(CONFIG_PATH_ENV)
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        Self { path, env }
    }

    /// Add or replace one captured environment variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Configuration file this loader reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, override, and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`] for an unreadable
    /// or malformed file, and [`ConfigError::InvalidField`] when an override
    /// cannot be parsed or validation fails.
    pub fn load(&self) -> ConfigResult<AppConfig> {
        let mut config = self.read_file()?;
        self.apply_env(&mut config)?;
        validate(&config)?;
        Ok(config)
    }

    fn read_file(&self) -> ConfigResult<AppConfig> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "configuration file not found; using defaults");
                return Ok(AppConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        debug!(path = %self.path.display(), "configuration file loaded");
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn var(&self, key: &str) -> Option<String> {
        self.env
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parsed<T: FromStr>(
        &self,
        key: &str,
        section: &'static str,
        field: &'static str,
        reason: &'static str,
    ) -> ConfigResult<Option<T>> {
        self.var(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| ConfigError::invalid(section, field, Some(raw.clone()), reason))
            })
            .transpose()
    }

    fn apply_env(&self, config: &mut AppConfig) -> ConfigResult<()> {
        if let Some(bind) =
            self.parsed::<IpAddr>("REELFETCH_BIND", "server", "bind", "must be an IP address")?
        {
            config.server.bind = bind;
        }
        if let Some(port) =
            self.parsed::<u16>("REELFETCH_PORT", "server", "port", "must be a port number")?
        {
            config.server.port = port;
        }
        if let Some(dir) = self.var("REELFETCH_DOWNLOAD_DIR") {
            config.transfers.download_dir = PathBuf::from(dir);
        }
        if let Some(limit) = self.parsed::<usize>(
            "REELFETCH_MAX_CONCURRENT",
            "transfers",
            "max_concurrent",
            "must be a non-negative integer",
        )? {
            config.transfers.max_concurrent = limit;
        }
        if let Some(level) = self.var("REELFETCH_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = self.var("REELFETCH_LOG_FORMAT") {
            config.logging.format = Some(format);
        }

        override_opt(&mut config.jellyfin.url, self.var("JELLYFIN_URL"));
        override_opt(&mut config.jellyfin.api_key, self.var("JELLYFIN_API_KEY"));
        override_opt(&mut config.qbittorrent.url, self.var("QBITTORRENT_URL"));
        override_opt(
            &mut config.qbittorrent.username,
            self.var("QBITTORRENT_USERNAME"),
        );
        override_opt(
            &mut config.qbittorrent.password,
            self.var("QBITTORRENT_PASSWORD"),
        );
        override_opt(&mut config.jackett.url, self.var("JACKETT_URL"));
        override_opt(&mut config.jackett.api_key, self.var("JACKETT_API_KEY"));
        Ok(())
    }
}

fn override_opt(target: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *target = value;
    }
}
