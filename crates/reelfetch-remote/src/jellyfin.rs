//! Jellyfin library refresh adapter.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use reelfetch_core::{FetchError, FetchResult, LibraryScanner, RefreshOutcome};
use reelfetch_telemetry::Metrics;
use tracing::info;
use url::Url;

use crate::http::{ServiceClient, endpoint, parse_base, present};

const SERVICE: &str = "Jellyfin";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const TOKEN_HEADER: &str = "X-Emby-Token";

/// Connection settings for the media server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JellyfinSettings {
    /// Server base URL, e.g. `http://localhost:8096`.
    pub url: Option<String>,
    /// API key sent as `X-Emby-Token`.
    pub api_key: Option<String>,
    /// Libraries to refresh individually; all libraries when empty.
    pub library_ids: Vec<String>,
}

/// Client that asks Jellyfin to rescan its libraries.
pub struct JellyfinClient {
    settings: JellyfinSettings,
    base: Option<Url>,
    http: ServiceClient,
}

impl JellyfinClient {
    /// Build a client; missing URL or key leaves it disabled.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] when the URL is malformed.
    pub fn new(settings: JellyfinSettings, metrics: Metrics) -> FetchResult<Self> {
        let base = parse_base("jellyfin.url", settings.url.as_deref())?;
        Ok(Self {
            settings,
            base,
            http: ServiceClient::new(SERVICE, REQUEST_TIMEOUT, metrics)?,
        })
    }

    async fn refresh_one(&self, base: &Url, api_key: &str, library_id: Option<&str>) -> FetchResult<()> {
        let mut request = self
            .http
            .client()
            .post(endpoint(SERVICE, base, "Library/Refresh")?)
            .header(TOKEN_HEADER, api_key);
        if let Some(library_id) = library_id {
            request = request.query(&[("libraryId", library_id)]);
        }
        let response = self.http.send(request).await?;
        self.http.ensure_success(response)?;
        Ok(())
    }
}

#[async_trait]
impl LibraryScanner for JellyfinClient {
    fn is_enabled(&self) -> bool {
        self.base.is_some() && present(self.settings.api_key.as_deref())
    }

    async fn refresh_library(&self) -> FetchResult<RefreshOutcome> {
        let (Some(base), Some(api_key)) = (&self.base, self.settings.api_key.as_deref()) else {
            return Err(FetchError::Configuration { service: SERVICE });
        };
        if !self.is_enabled() {
            return Err(FetchError::Configuration { service: SERVICE });
        }

        let library_ids: Vec<&str> = self
            .settings
            .library_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect();
        if library_ids.is_empty() {
            self.refresh_one(base, api_key, None).await?;
        } else {
            try_join_all(
                library_ids
                    .iter()
                    .copied()
                    .map(|id| self.refresh_one(base, api_key, Some(id))),
            )
            .await?;
        }

        info!(libraries = library_ids.len(), "Jellyfin library refresh requested");
        Ok(RefreshOutcome {
            success: true,
            message: "Library refresh initiated".to_string(),
        })
    }
}
