//! Per-route request counting.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{extract::MatchedPath, http::Request, response::Response};
use reelfetch_telemetry::Metrics;
use tower::{Layer, Service};

/// Route label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

type CountedFuture<E> = Pin<Box<dyn Future<Output = Result<Response, E>> + Send>>;

/// Records `http_requests_total{route, code}` for each response.
#[derive(Clone)]
pub(crate) struct HttpMetricsLayer {
    metrics: Metrics,
}

impl HttpMetricsLayer {
    pub(crate) const fn new(metrics: Metrics) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for HttpMetricsLayer {
    type Service = HttpMetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpMetricsService {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct HttpMetricsService<S> {
    inner: S,
    metrics: Metrics,
}

impl<S, B> Service<Request<B>> for HttpMetricsService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = CountedFuture<S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        // Raw paths would give every download id its own series.
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
            .to_owned();
        let metrics = self.metrics.clone();
        let pending = self.inner.call(request);

        Box::pin(async move {
            let response = pending.await?;
            metrics.inc_http_request(&route, response.status().as_u16());
            Ok(response)
        })
    }
}
