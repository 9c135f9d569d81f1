//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    routing::{delete, get, post},
};
use reelfetch_telemetry::{Metrics, build_sha};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::HEADER_REQUEST_ID;
use crate::http::downloads::{cancel_download, list_downloads, list_jobs, submit_download};
use crate::http::health::{health, metrics, not_found, status};
use crate::http::integrations::{
    library_status, list_torrents, refresh_library, search, submit_torrent,
};
use crate::http::telemetry::HttpMetricsLayer;
use crate::state::{ApiServices, ApiState};

/// Prefix under which every route is mounted a second time.
pub const API_PREFIX: &str = "/api";

/// Axum router wrapper that hosts the Reelfetch API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Wire the services into a fully layered router.
    #[must_use]
    pub fn new(services: ApiServices, telemetry: Metrics) -> Self {
        let state = Arc::new(ApiState::new(services, telemetry.clone()));
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(HEADER_REQUEST_ID)]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(reelfetch_telemetry::propagate_request_id_layer())
            .layer(reelfetch_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let routes = Self::routes();
        let router = Router::new()
            .merge(routes.clone())
            .nest(API_PREFIX, routes)
            .fallback(not_found)
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/download", post(submit_download))
            .route("/downloads", get(list_downloads))
            .route("/downloads/{id}", delete(cancel_download))
            .route("/torrent/download", post(submit_torrent))
            .route("/torrents", get(list_torrents))
            .route("/jobs", get(list_jobs))
            .route("/search", post(search))
            .route("/jellyfin/refresh", post(refresh_library))
            .route("/jellyfin/status", get(library_status))
            .route("/status", get(status))
            .route("/health", get(health))
            .route("/metrics", get(metrics))
    }

    /// Router with state applied, for embedding or in-process tests.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind `addr` and serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Bind`] when the listener cannot be bound and
    /// [`ApiServerError::Serve`] when the server stops with an IO failure.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(addr = %addr, "API listener bound");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}
