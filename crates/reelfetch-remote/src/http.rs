//! Request plumbing shared by the adapters.
//!
//! Every call goes through [`ServiceClient::send`], which applies the
//! adapter's deadline, classifies transport failures, and counts outcomes.

use std::time::Duration;

use reelfetch_core::{FetchError, FetchResult};
use reelfetch_telemetry::Metrics;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

pub(crate) const USER_AGENT: &str = concat!("reelfetch/", env!("CARGO_PKG_VERSION"));

pub(crate) struct ServiceClient {
    service: &'static str,
    client: Client,
    timeout: Duration,
    metrics: Metrics,
}

impl ServiceClient {
    pub(crate) fn new(service: &'static str, timeout: Duration, metrics: Metrics) -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| FetchError::upstream(service, err.to_string()))?;
        Ok(Self {
            service,
            client,
            timeout,
            metrics,
        })
    }

    pub(crate) const fn service(&self) -> &'static str {
        self.service
    }

    pub(crate) const fn client(&self) -> &Client {
        &self.client
    }

    /// Send with the adapter deadline; any response (including non-2xx) is `Ok`.
    pub(crate) async fn send(&self, request: RequestBuilder) -> FetchResult<Response> {
        match request.timeout(self.timeout).send().await {
            Ok(response) => {
                let outcome = if response.status().is_success() { "ok" } else { "error" };
                self.metrics.inc_remote_call(self.service, outcome);
                Ok(response)
            }
            Err(err) if err.is_timeout() => {
                self.metrics.inc_remote_call(self.service, "timeout");
                Err(FetchError::Timeout {
                    service: self.service,
                    after: self.timeout,
                })
            }
            Err(err) => {
                self.metrics.inc_remote_call(self.service, "error");
                Err(FetchError::upstream(self.service, err.to_string()))
            }
        }
    }

    /// Map a non-2xx response to an upstream failure carrying status and reason.
    pub(crate) fn ensure_success(&self, response: Response) -> FetchResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(FetchError::upstream_status(
                self.service,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
            ))
        }
    }

    /// Read the body as text.
    pub(crate) async fn read_text(&self, response: Response) -> FetchResult<String> {
        response
            .text()
            .await
            .map_err(|err| FetchError::upstream(self.service, err.to_string()))
    }

    /// Decode a JSON body; anything unparseable is an upstream failure.
    pub(crate) async fn read_json<T: DeserializeOwned>(&self, response: Response) -> FetchResult<T> {
        let body = self.read_text(response).await?;
        serde_json::from_str(&body).map_err(|_| {
            FetchError::upstream(
                self.service,
                format!("invalid JSON response from {}", self.service),
            )
        })
    }
}

/// Parse an optional base URL; blank values mean "not configured".
pub(crate) fn parse_base(
    field: &'static str,
    raw: Option<&str>,
) -> FetchResult<Option<Url>> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let url = Url::parse(raw).map_err(|_| FetchError::invalid_value(field, "is not a valid URL", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(Some(url)),
        _ => Err(FetchError::invalid_value(
            field,
            "must use http or https",
            raw,
        )),
    }
}

/// Append `path` to `base`, keeping any path prefix on the base.
pub(crate) fn endpoint(service: &'static str, base: &Url, path: &str) -> FetchResult<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|_| FetchError::upstream(service, "endpoint URL could not be built"))
}

/// Whether a configured secret is present.
pub(crate) fn present(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_prefix() -> FetchResult<()> {
        let base = Url::parse("http://nas.local:8080/qbt/").map_err(|_| FetchError::upstream("t", "bad"))?;
        assert_eq!(
            endpoint("t", &base, "/api/v2/app/version")?.as_str(),
            "http://nas.local:8080/qbt/api/v2/app/version"
        );
        let bare = Url::parse("http://nas.local:8080").map_err(|_| FetchError::upstream("t", "bad"))?;
        assert_eq!(
            endpoint("t", &bare, "api/v2/app/version")?.as_str(),
            "http://nas.local:8080/api/v2/app/version"
        );
        Ok(())
    }

    #[test]
    fn blank_bases_are_unconfigured_and_bad_ones_rejected() {
        assert!(matches!(parse_base("jellyfin.url", None), Ok(None)));
        assert!(matches!(parse_base("jellyfin.url", Some("  ")), Ok(None)));
        assert!(parse_base("jellyfin.url", Some("not a url")).is_err());
        assert!(parse_base("jellyfin.url", Some("ftp://host")).is_err());
        assert!(matches!(
            parse_base("jellyfin.url", Some("http://localhost:8096")),
            Ok(Some(_))
        ));
    }

    #[test]
    fn presence_ignores_whitespace() {
        assert!(present(Some("key")));
        assert!(!present(Some("  ")));
        assert!(!present(None));
    }
}
