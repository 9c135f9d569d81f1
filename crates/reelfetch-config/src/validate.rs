//! Field-level validation applied after all overrides.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;

pub(crate) fn validate(config: &AppConfig) -> ConfigResult<()> {
    if config.server.port == 0 {
        return Err(ConfigError::invalid(
            "server",
            "port",
            Some("0".to_string()),
            "must be greater than zero",
        ));
    }

    let transfers = &config.transfers;
    if transfers.download_dir.as_os_str().is_empty() {
        return Err(ConfigError::invalid(
            "transfers",
            "download_dir",
            None,
            "must not be empty",
        ));
    }
    if transfers.max_concurrent == 0 {
        return Err(ConfigError::invalid(
            "transfers",
            "max_concurrent",
            Some("0".to_string()),
            "must be greater than zero",
        ));
    }
    if transfers.idle_timeout_secs == 0 {
        return Err(ConfigError::invalid(
            "transfers",
            "idle_timeout_secs",
            Some("0".to_string()),
            "must be greater than zero",
        ));
    }

    check_url("jellyfin", config.jellyfin.url.as_deref())?;
    check_url("qbittorrent", config.qbittorrent.url.as_deref())?;
    check_url("jackett", config.jackett.url.as_deref())?;

    if config.qbittorrent.category.trim().is_empty() {
        return Err(ConfigError::invalid(
            "qbittorrent",
            "category",
            None,
            "must not be empty",
        ));
    }

    if let Some(format) = config.logging.format.as_deref() {
        let known = ["json", "pretty"]
            .iter()
            .any(|label| format.trim().eq_ignore_ascii_case(label));
        if !known {
            return Err(ConfigError::invalid(
                "logging",
                "format",
                Some(format.to_string()),
                "must be json or pretty",
            ));
        }
    }
    Ok(())
}

fn check_url(section: &'static str, raw: Option<&str>) -> ConfigResult<()> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(());
    };
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err(ConfigError::invalid(
            section,
            "url",
            Some(raw.to_string()),
            "must use http or https",
        )),
        Err(_) => Err(ConfigError::invalid(
            section,
            "url",
            Some(raw.to_string()),
            "is not a valid URL",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let mut config = AppConfig::default();
        config.transfers.max_concurrent = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidField {
                section: "transfers",
                field: "max_concurrent",
                ..
            })
        ));
    }

    #[test]
    fn adapter_urls_must_be_http() {
        let mut config = AppConfig::default();
        config.jackett.url = Some("ftp://indexer".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidField {
                section: "jackett",
                reason: "must use http or https",
                ..
            })
        ));

        config.jackett.url = Some("not a url".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidField {
                reason: "is not a valid URL",
                ..
            })
        ));

        config.jackett.url = Some("   ".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let mut config = AppConfig::default();
        config.logging.format = Some("xml".to_string());
        assert!(validate(&config).is_err());
        config.logging.format = Some("JSON".to_string());
        assert!(validate(&config).is_ok());
    }
}
