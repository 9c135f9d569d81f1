//! qBittorrent Web API v2 adapter.
//!
//! # Design
//! - The `SID` cookie lives in an owned [`SessionCache`] behind one mutex;
//!   concurrent refreshes are last-writer-wins.
//! - A cached session is probed with `app/version` before use; a 401/403
//!   probe discards it and logs in again.
//! - A call rejected with 401/403 triggers exactly one re-login and one retry.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reelfetch_core::naming::{format_bytes, format_rate, sanitize_filename};
use reelfetch_core::{FetchError, FetchResult, RemoteJob, RemoteJobs, RemoteSubmission};
use reelfetch_telemetry::Metrics;
use reqwest::header::{COOKIE, REFERER, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::http::{ServiceClient, endpoint, parse_base, present};

const SERVICE: &str = "qBittorrent";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Category applied to torrents added by Reelfetch.
pub const DEFAULT_CATEGORY: &str = "reelfetch";
const LOGIN_REJECTED_BODY: &str = "Fails.";

/// Connection settings for the torrent daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QbittorrentSettings {
    /// Web UI base URL, e.g. `http://localhost:8080`.
    pub url: Option<String>,
    /// Web UI username.
    pub username: Option<String>,
    /// Web UI password.
    pub password: Option<String>,
    /// Save path handed to the daemon; the daemon default when `None`.
    pub save_path: Option<String>,
    /// Category applied to added torrents.
    pub category: String,
}

/// Cached `SID` session cookie.
#[derive(Default)]
struct SessionCache {
    sid: Mutex<Option<String>>,
}

impl SessionCache {
    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.sid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> Option<String> {
        self.lock().clone()
    }

    fn store(&self, sid: String) {
        *self.lock() = Some(sid);
    }

    fn invalidate(&self) {
        self.lock().take();
    }
}

#[derive(Debug, Deserialize)]
struct TorrentInfo {
    #[serde(default)]
    hash: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    state: String,
    #[serde(default)]
    eta: i64,
    #[serde(default)]
    dlspeed: i64,
    #[serde(default)]
    upspeed: i64,
    #[serde(default)]
    num_seeds: i64,
    #[serde(default)]
    num_leechs: i64,
}

impl TorrentInfo {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn into_job(self) -> RemoteJob {
        let clamp = |value: i64| u64::try_from(value).unwrap_or(0);
        RemoteJob {
            hash: self.hash,
            name: self.name,
            size: format_bytes(clamp(self.size)),
            progress: (self.progress * 100.0).round().clamp(0.0, 100.0) as u8,
            state: self.state,
            eta: self.eta,
            download_speed: format_rate(clamp(self.dlspeed)),
            upload_speed: format_rate(clamp(self.upspeed)),
            seeders: clamp(self.num_seeds),
            peers: clamp(self.num_leechs),
        }
    }
}

/// Client for the qBittorrent Web API.
pub struct QbittorrentClient {
    settings: QbittorrentSettings,
    base: Option<Url>,
    http: ServiceClient,
    session: SessionCache,
}

impl QbittorrentClient {
    /// Build a client; a missing URL leaves the adapter unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] when the URL is malformed.
    pub fn new(settings: QbittorrentSettings, metrics: Metrics) -> FetchResult<Self> {
        let base = parse_base("qbittorrent.url", settings.url.as_deref())?;
        Ok(Self {
            settings,
            base,
            http: ServiceClient::new(SERVICE, REQUEST_TIMEOUT, metrics)?,
            session: SessionCache::default(),
        })
    }

    fn base(&self) -> FetchResult<&Url> {
        match &self.base {
            Some(base) if self.is_available() => Ok(base),
            _ => Err(FetchError::Configuration { service: SERVICE }),
        }
    }

    fn url(&self, path: &str) -> FetchResult<Url> {
        endpoint(SERVICE, self.base()?, path)
    }

    async fn login(&self) -> FetchResult<String> {
        let base = self.base()?;
        let form = [
            ("username", self.settings.username.clone().unwrap_or_default()),
            ("password", self.settings.password.clone().unwrap_or_default()),
        ];
        let request = self
            .http
            .client()
            .post(self.url("api/v2/auth/login")?)
            .header(REFERER, base.as_str())
            .form(&form);
        let response = self.http.send(request).await?;
        let response = self.http.ensure_success(response)?;
        let sid = session_cookie(&response);
        let body = self.http.read_text(response).await?;

        if body.trim() == LOGIN_REJECTED_BODY {
            warn!("qBittorrent rejected the configured credentials");
            return Err(FetchError::upstream(SERVICE, "login rejected"));
        }
        let sid = sid.ok_or_else(|| {
            FetchError::upstream(SERVICE, "login response did not include a session cookie")
        })?;
        self.session.store(sid.clone());
        debug!("qBittorrent session established");
        Ok(sid)
    }

    async fn session(&self) -> FetchResult<String> {
        if let Some(sid) = self.session.current() {
            let probe = self
                .http
                .client()
                .get(self.url("api/v2/app/version")?)
                .header(COOKIE, cookie(&sid));
            match self.http.send(probe).await {
                Ok(response) if response.status().is_success() => return Ok(sid),
                Ok(response) => {
                    debug!(status = response.status().as_u16(), "qBittorrent session probe rejected");
                }
                Err(err) => debug!(error = %err, "qBittorrent session probe failed"),
            }
            self.session.invalidate();
        }
        self.login().await
    }

    /// Send an authenticated request, re-authenticating once on rejection.
    async fn authorized<F>(&self, build: F) -> FetchResult<Response>
    where
        F: Fn(&Client) -> FetchResult<RequestBuilder> + Send + Sync,
    {
        let sid = self.session().await?;
        let response = self
            .http
            .send(build(self.http.client())?.header(COOKIE, cookie(&sid)))
            .await?;
        if !is_rejection(response.status()) {
            return self.http.ensure_success(response);
        }

        debug!("qBittorrent rejected the session; logging in again");
        self.session.invalidate();
        let sid = self.login().await?;
        let retried = self
            .http
            .send(build(self.http.client())?.header(COOKIE, cookie(&sid)))
            .await?;
        self.http.ensure_success(retried)
    }
}

#[async_trait]
impl RemoteJobs for QbittorrentClient {
    fn is_available(&self) -> bool {
        self.base.is_some()
            && present(self.settings.username.as_deref())
            && present(self.settings.password.as_deref())
    }

    async fn submit_remote(&self, link: &str, title: &str) -> FetchResult<RemoteSubmission> {
        if !self.is_available() {
            return Err(FetchError::Configuration { service: SERVICE });
        }
        let link = link.trim();
        if link.is_empty() {
            return Err(FetchError::invalid("magnetLink", "is required"));
        }

        let mut form = vec![
            ("urls", link.to_string()),
            ("category", self.settings.category.clone()),
        ];
        if !title.trim().is_empty() {
            form.push(("rename", sanitize_filename(title)));
        }
        if let Some(save_path) = self
            .settings
            .save_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
        {
            form.push(("savepath", save_path.to_string()));
        }

        let add_url = self.url("api/v2/torrents/add")?;
        let response = self
            .authorized(|client| Ok(client.post(add_url.clone()).form(&form)))
            .await?;
        let body = self.http.read_text(response).await?;
        if body.trim() == LOGIN_REJECTED_BODY {
            return Err(FetchError::upstream(
                SERVICE,
                "torrent was rejected by qBittorrent",
            ));
        }

        info!(title = %title, category = %self.settings.category, "torrent handed to qBittorrent");
        Ok(RemoteSubmission {
            success: true,
            message: "Torrent added to qBittorrent".to_string(),
        })
    }

    async fn list_remote(&self) -> FetchResult<Vec<RemoteJob>> {
        if !self.is_available() {
            return Ok(Vec::new());
        }
        let info_url = self.url("api/v2/torrents/info")?;
        let response = self
            .authorized(|client| Ok(client.get(info_url.clone())))
            .await?;
        let torrents: Vec<TorrentInfo> = self.http.read_json(response).await?;
        Ok(torrents.into_iter().map(TorrentInfo::into_job).collect())
    }
}

impl std::fmt::Debug for QbittorrentClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("QbittorrentClient")
            .field("service", &self.http.service())
            .field("base", &self.base.as_ref().map(Url::as_str))
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}

const fn is_rejection(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

fn cookie(sid: &str) -> String {
    format!("SID={sid}")
}

fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find_map(|pair| pair.trim().strip_prefix("SID="))
        .filter(|sid| !sid.is_empty())
        .map(str::to_string)
}
