//! Request correlation for the HTTP surface.
//!
//! Both layers use the `x-request-id` header.

use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Assigns a UUID to requests that arrive without a correlation id.
#[must_use]
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Echoes the correlation id back on the response.
#[must_use]
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
