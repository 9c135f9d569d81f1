//! Jackett indexer-aggregator search adapter.
//!
//! # Design
//! - Only the first [`MAX_RESULTS`] raw hits are considered, and hits without
//!   a magnet or download link are dropped.
//! - Ranking is seeders descending, then quality score descending.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reelfetch_core::naming::format_bytes;
use reelfetch_core::{
    ContentType, FetchError, FetchResult, SearchProvider, SearchResponse, SearchResult,
};
use reelfetch_telemetry::Metrics;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::http::{ServiceClient, endpoint, parse_base, present};

const SERVICE: &str = "Jackett";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Raw hits considered per search.
pub const MAX_RESULTS: usize = 20;
const UNKNOWN: &str = "Unknown";

static QUALITY_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(2160p|4K|1080p|720p|480p|HDTV|BluRay|WEBRip|DVDRip|CAM|TS)").ok()
});

/// Connection settings for the indexer aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JackettSettings {
    /// Jackett base URL, e.g. `http://localhost:9117`.
    pub url: Option<String>,
    /// Jackett API key.
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "Results", default)]
    results: Option<Vec<RawResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawResult {
    title: Option<String>,
    size: Option<u64>,
    seeders: Option<u64>,
    peers: Option<u64>,
    category_desc: Option<String>,
    category: Option<Value>,
    tracker: Option<String>,
    magnet_uri: Option<String>,
    link: Option<String>,
    publish_date: Option<String>,
    imdb: Option<Value>,
}

impl RawResult {
    fn into_result(self) -> SearchResult {
        let title = self
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| "Unknown Title".to_string());
        SearchResult {
            quality: detect_quality(&title),
            size: self
                .size
                .filter(|size| *size > 0)
                .map_or_else(|| UNKNOWN.to_string(), format_bytes),
            seeders: self.seeders.unwrap_or(0),
            peers: self.peers.unwrap_or(0),
            category: self
                .category_desc
                .filter(|desc| !desc.is_empty())
                .or_else(|| self.category.as_ref().and_then(render_scalar)),
            indexer: self
                .tracker
                .filter(|tracker| !tracker.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            magnet_link: self.magnet_uri.filter(|link| !link.is_empty()),
            download_link: self.link.filter(|link| !link.is_empty()),
            publish_date: self.publish_date,
            imdb_id: self.imdb.as_ref().and_then(render_scalar),
            title,
        }
    }
}

/// Client for Jackett's aggregate search endpoint.
pub struct JackettClient {
    settings: JackettSettings,
    base: Option<Url>,
    http: ServiceClient,
}

impl JackettClient {
    /// Build a client; missing URL or key leaves it disabled.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] when the URL is malformed.
    pub fn new(settings: JackettSettings, metrics: Metrics) -> FetchResult<Self> {
        let base = parse_base("jackett.url", settings.url.as_deref())?;
        Ok(Self {
            settings,
            base,
            http: ServiceClient::new(SERVICE, REQUEST_TIMEOUT, metrics)?,
        })
    }
}

#[async_trait]
impl SearchProvider for JackettClient {
    fn is_enabled(&self) -> bool {
        self.base.is_some() && present(self.settings.api_key.as_deref())
    }

    async fn search(&self, query: &str, content_type: ContentType) -> FetchResult<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetchError::invalid("query", "is required"));
        }
        let (Some(base), Some(api_key), true) = (
            &self.base,
            self.settings.api_key.as_deref(),
            self.is_enabled(),
        ) else {
            return Err(FetchError::Configuration { service: SERVICE });
        };

        let request = self
            .http
            .client()
            .get(endpoint(SERVICE, base, "api/v2.0/indexers/all/results")?)
            .query(&[
                ("apikey", api_key),
                ("Query", query),
                ("Category", content_type.category_code()),
            ]);
        let response = self.http.send(request).await?;
        let response = self.http.ensure_success(response)?;
        let envelope: SearchEnvelope = self.http.read_json(response).await?;

        let results = rank(envelope.results.unwrap_or_default());
        info!(
            query = %query,
            content_type = content_type.as_str(),
            results = results.len(),
            "Jackett search completed"
        );
        Ok(SearchResponse {
            query: query.to_string(),
            content_type,
            results,
        })
    }
}

fn rank(raw: Vec<RawResult>) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = raw
        .into_iter()
        .take(MAX_RESULTS)
        .map(RawResult::into_result)
        .filter(|result| result.magnet_link.is_some() || result.download_link.is_some())
        .collect();
    results.sort_by(|left, right| {
        right.seeders.cmp(&left.seeders).then_with(|| {
            quality_score(&right.quality).cmp(&quality_score(&left.quality))
        })
    });
    results
}

fn detect_quality(title: &str) -> String {
    QUALITY_PATTERN
        .as_ref()
        .and_then(|pattern| pattern.find(title))
        .map_or_else(|| UNKNOWN.to_string(), |found| found.as_str().to_uppercase())
}

fn quality_score(quality: &str) -> u8 {
    match quality {
        "2160P" | "4K" => 100,
        "1080P" => 80,
        "720P" => 60,
        "480P" => 40,
        "HDTV" => 30,
        "DVDRIP" => 20,
        "CAM" => 10,
        "TS" => 5,
        _ => 0,
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(render_scalar).collect();
            (!parts.is_empty()).then(|| parts.join(","))
        }
        _ => None,
    }
}
