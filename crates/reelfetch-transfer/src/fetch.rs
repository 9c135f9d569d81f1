//! Redirect-following fetch that streams a response body to disk.
//!
//! # Design
//! - Redirects are followed by hand so the hop count is ours to cap.
//! - Every network wait races the job's cancellation token and the idle
//!   deadline; the file is only created once a 2xx response arrives.
//! - Progress is published after each chunk is written.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reelfetch_core::{FetchError, TransferProgress};
use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Service label used in errors raised while talking to a download source.
pub(crate) const SOURCE_SERVICE: &str = "download source";

/// Why a transfer stopped before completing.
#[derive(Debug)]
pub(crate) enum Halt {
    Cancelled,
    Failed(FetchError),
}

impl From<FetchError> for Halt {
    fn from(err: FetchError) -> Self {
        Self::Failed(err)
    }
}

pub(crate) struct FetchRequest<'a> {
    pub(crate) client: &'a Client,
    pub(crate) token: &'a CancellationToken,
    pub(crate) idle_timeout: Duration,
    pub(crate) max_redirects: usize,
}

impl FetchRequest<'_> {
    /// Await `future`, giving up on cancellation or when the idle deadline passes.
    async fn guarded<F: Future>(&self, future: F) -> Result<F::Output, Halt> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Halt::Cancelled),
            outcome = tokio::time::timeout(self.idle_timeout, future) => {
                outcome.map_err(|_| Halt::Failed(FetchError::Timeout {
                    service: SOURCE_SERVICE,
                    after: self.idle_timeout,
                }))
            }
        }
    }

    /// Follow redirects until a non-redirect response, which must be 2xx.
    pub(crate) async fn open(&self, url: &Url) -> Result<Response, Halt> {
        let mut current = url.clone();
        let mut hops = 0_usize;
        loop {
            let response = self
                .guarded(self.client.get(current.clone()).send())
                .await?
                .map_err(|err| transport_error(&err, self.idle_timeout))?;
            let status = response.status();

            if is_followed_redirect(status) {
                if hops >= self.max_redirects {
                    return Err(FetchError::upstream(SOURCE_SERVICE, "too many redirects").into());
                }
                let next = redirect_target(&current, &response)?;
                hops += 1;
                debug!(from = %current, to = %next, hop = hops, "following redirect");
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::upstream_status(
                    SOURCE_SERVICE,
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown Status"),
                )
                .into());
            }
            return Ok(response);
        }
    }

    /// Stream `response` into `path`, reporting progress after every chunk.
    pub(crate) async fn write_body(
        &self,
        response: Response,
        path: &Path,
        mut on_progress: impl FnMut(TransferProgress, u64),
    ) -> Result<u64, Halt> {
        let total = response.content_length().filter(|len| *len > 0);
        let file = File::create(path)
            .await
            .map_err(|err| FetchError::io("create destination file", Some(path.to_path_buf()), err))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut downloaded = 0_u64;

        while let Some(chunk) = self.guarded(stream.next()).await? {
            let chunk = chunk.map_err(|err| transport_error(&err, self.idle_timeout))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|err| FetchError::io("write chunk", Some(path.to_path_buf()), err))?;
            let written = chunk.len() as u64;
            downloaded += written;
            on_progress(TransferProgress { downloaded, total }, written);
        }

        writer
            .flush()
            .await
            .map_err(|err| FetchError::io("flush destination file", Some(path.to_path_buf()), err))?;
        Ok(downloaded)
    }
}

const fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn redirect_target(current: &Url, response: &Response) -> Result<Url, FetchError> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            FetchError::upstream_status(
                SOURCE_SERVICE,
                response.status().as_u16(),
                "redirect without a Location header",
            )
        })?;
    let next = current
        .join(location.trim())
        .map_err(|_| FetchError::upstream(SOURCE_SERVICE, "redirect to an invalid location"))?;
    match next.scheme() {
        "http" | "https" => Ok(next),
        _ => Err(FetchError::upstream(
            SOURCE_SERVICE,
            "redirect to an unsupported scheme",
        )),
    }
}

fn transport_error(err: &reqwest::Error, idle_timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            service: SOURCE_SERVICE,
            after: idle_timeout,
        }
    } else {
        FetchError::upstream(SOURCE_SERVICE, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_standard_redirects_are_followed() {
        assert!(is_followed_redirect(StatusCode::FOUND));
        assert!(is_followed_redirect(StatusCode::PERMANENT_REDIRECT));
        assert!(!is_followed_redirect(StatusCode::NOT_MODIFIED));
        assert!(!is_followed_redirect(StatusCode::MULTIPLE_CHOICES));
    }
}
