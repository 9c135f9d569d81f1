//! RFC9457-style API error wrapper.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reelfetch_core::{ErrorKind, FetchError};

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_CAPACITY, PROBLEM_INTERNAL, PROBLEM_NOT_CONFIGURED,
    PROBLEM_NOT_FOUND, PROBLEM_UPSTREAM, PROBLEM_UPSTREAM_TIMEOUT,
};
use crate::models::{ProblemDetails, ProblemInvalidParam};

/// Structured API error with optional RFC9457 fields.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    pub(crate) invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            invalid_params: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn with_invalid_params(mut self, params: Vec<ProblemInvalidParam>) -> Self {
        self.invalid_params = Some(params);
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROBLEM_NOT_FOUND,
            "resource not found",
        )
        .with_detail(detail)
    }

    pub(crate) fn too_many_requests(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            PROBLEM_CAPACITY,
            "capacity exceeded",
        )
        .with_detail(detail)
    }

    pub(crate) fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            PROBLEM_NOT_CONFIGURED,
            "integration not configured",
        )
        .with_detail(detail)
    }

    pub(crate) fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            PROBLEM_UPSTREAM,
            "upstream request failed",
        )
        .with_detail(detail)
    }

    pub(crate) fn gateway_timeout(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            PROBLEM_UPSTREAM_TIMEOUT,
            "upstream request timed out",
        )
        .with_detail(detail)
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        let detail = err.detail();
        match (err.kind(), &err) {
            (ErrorKind::InvalidInput, FetchError::InvalidInput { field, reason, .. }) => {
                Self::bad_request(detail).with_invalid_params(vec![ProblemInvalidParam {
                    pointer: format!("/{field}"),
                    message: (*reason).to_string(),
                }])
            }
            (ErrorKind::InvalidInput, _) => Self::bad_request(detail),
            (ErrorKind::CapacityExceeded, _) => Self::too_many_requests(detail),
            (ErrorKind::Configuration, _) => Self::service_unavailable(detail),
            (ErrorKind::Upstream, _) => Self::bad_gateway(detail),
            (ErrorKind::Timeout, _) => Self::gateway_timeout(detail),
            (ErrorKind::Io, _) => Self::internal(detail),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_params: self.invalid_params,
        };
        (self.status, Json(body)).into_response()
    }
}
