use std::path::PathBuf;
use std::sync::Arc;

use reelfetch_api::{ApiServer, ApiServices};
use reelfetch_config::{
    AppConfig, ConfigLoader, JackettConfig, JellyfinConfig, QbittorrentConfig, TransfersConfig,
};
use reelfetch_core::{LibraryScanner, RemoteJobs, SearchProvider};
use reelfetch_remote::{
    JackettClient, JackettSettings, JellyfinClient, JellyfinSettings, QbittorrentClient,
    QbittorrentSettings,
};
use reelfetch_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics, build_sha};
use reelfetch_transfer::{TransferConfig, TransferEngine};
use tracing::{error, info};

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap Reelfetch.
pub(crate) struct BootstrapDependencies {
    config: AppConfig,
    config_path: PathBuf,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let loader = ConfigLoader::from_env();
        let config = loader
            .load()
            .map_err(|err| AppError::config("config.load", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            config_path: loader.path().to_path_buf(),
            telemetry,
        })
    }
}

/// Entry point for the Reelfetch boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging, service construction, or the
/// listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies {
        config,
        config_path,
        telemetry,
    } = dependencies;

    let logging = LoggingConfig {
        level: &config.logging.level,
        format: LogFormat::from_label(config.logging.format.as_deref()),
        build_sha: build_sha(),
    };
    reelfetch_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("reelfetch");

    info!(config = %config_path.display(), "Reelfetch bootstrap starting");

    let services = build_services(&config, &telemetry)?;
    log_startup_summary(&config, &services);

    let engine = services.transfers.clone();
    let api = ApiServer::new(services, telemetry);
    let addr = config.server.socket_addr();
    info!(addr = %addr, "Launching API listener");

    let result = api
        .serve(addr, async move {
            shutdown_signal().await;
            engine.shutdown().await;
            info!("in-flight transfers cancelled");
        })
        .await;
    if let Err(err) = &result {
        error!(error = %err, "API server stopped with an error");
    }
    info!("Reelfetch shut down");
    result.map_err(|err| AppError::api_server("api_server.serve", err))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => error!(error = %err, "failed to listen for shutdown signal"),
    }
}

pub(crate) fn build_services(config: &AppConfig, telemetry: &Metrics) -> AppResult<ApiServices> {
    let transfers = TransferEngine::new(transfer_config(&config.transfers), telemetry.clone())
        .map_err(|err| AppError::service("transfer_engine.new", err))?;
    let remote: Arc<dyn RemoteJobs> = Arc::new(
        QbittorrentClient::new(qbittorrent_settings(&config.qbittorrent), telemetry.clone())
            .map_err(|err| AppError::service("qbittorrent.new", err))?,
    );
    let library: Arc<dyn LibraryScanner> = Arc::new(
        JellyfinClient::new(jellyfin_settings(&config.jellyfin), telemetry.clone())
            .map_err(|err| AppError::service("jellyfin.new", err))?,
    );
    let search: Arc<dyn SearchProvider> = Arc::new(
        JackettClient::new(jackett_settings(&config.jackett), telemetry.clone())
            .map_err(|err| AppError::service("jackett.new", err))?,
    );
    Ok(ApiServices {
        transfers,
        remote,
        library,
        search,
    })
}

fn transfer_config(section: &TransfersConfig) -> TransferConfig {
    TransferConfig {
        download_dir: section.download_dir.clone(),
        max_concurrent: section.max_concurrent,
        idle_timeout: section.idle_timeout(),
        failure_grace: section.failure_grace(),
        completed_retention: section.completed_retention(),
        max_redirects: section.max_redirects,
    }
}

fn qbittorrent_settings(section: &QbittorrentConfig) -> QbittorrentSettings {
    QbittorrentSettings {
        url: section.url.clone(),
        username: section.username.clone(),
        password: section.password.clone(),
        save_path: section.download_path.clone(),
        category: section.category.clone(),
    }
}

fn jellyfin_settings(section: &JellyfinConfig) -> JellyfinSettings {
    JellyfinSettings {
        url: section.url.clone(),
        api_key: section.api_key.clone(),
        library_ids: section.library_ids.clone(),
    }
}

fn jackett_settings(section: &JackettConfig) -> JackettSettings {
    JackettSettings {
        url: section.url.clone(),
        api_key: section.api_key.clone(),
    }
}

const fn toggle(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

fn log_startup_summary(config: &AppConfig, services: &ApiServices) {
    let transfers = services.transfers.config();
    info!(
        download_folder = %transfers.download_dir.display(),
        max_concurrent = transfers.max_concurrent,
        completed_retention_secs = config.transfers.completed_retention_secs,
        "direct downloads ready"
    );
    info!(
        jellyfin = toggle(services.library.is_enabled()),
        jellyfin_url = config.jellyfin.url.as_deref().unwrap_or("-"),
        qbittorrent = toggle(services.remote.is_available()),
        qbittorrent_url = config.qbittorrent.url.as_deref().unwrap_or("-"),
        jackett = toggle(services.search.is_enabled()),
        jackett_url = config.jackett.url.as_deref().unwrap_or("-"),
        "integrations configured"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn transfer_section_maps_onto_engine_config() {
        let mut section = TransfersConfig::default();
        section.max_concurrent = 7;
        section.completed_retention_secs = 45;
        let mapped = transfer_config(&section);
        assert_eq!(mapped.max_concurrent, 7);
        assert_eq!(mapped.idle_timeout, Duration::from_secs(30));
        assert_eq!(mapped.completed_retention, Duration::from_secs(45));
        assert_eq!(mapped.max_redirects, 10);
    }

    #[test]
    fn qbittorrent_download_path_becomes_save_path() {
        let section = QbittorrentConfig {
            download_path: Some("/data/torrents".to_string()),
            ..QbittorrentConfig::default()
        };
        let settings = qbittorrent_settings(&section);
        assert_eq!(settings.save_path.as_deref(), Some("/data/torrents"));
        assert_eq!(settings.category, "reelfetch");
    }

    #[tokio::test]
    async fn services_build_with_integrations_disabled_by_default() -> AppResult<()> {
        let dir = tempfile::TempDir::new().map_err(|err| {
            AppError::service(
                "tempdir",
                reelfetch_core::FetchError::io("create temp dir", None, err),
            )
        })?;
        let mut config = AppConfig::default();
        config.transfers.download_dir = dir.path().join("media");
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;

        let services = build_services(&config, &telemetry)?;
        assert!(!services.library.is_enabled());
        assert!(!services.remote.is_available());
        assert!(!services.search.is_enabled());
        assert!(dir.path().join("media").is_dir());
        Ok(())
    }

    #[test]
    fn malformed_integration_url_fails_service_construction() -> AppResult<()> {
        let mut config = AppConfig::default();
        config.transfers.download_dir = std::env::temp_dir().join("reelfetch-bootstrap-test");
        config.jackett.url = Some("::not-a-url".to_string());
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        let result = build_services(&config, &telemetry);
        assert!(matches!(
            result,
            Err(AppError::Service {
                operation: "jackett.new",
                ..
            })
        ));
        Ok(())
    }
}
