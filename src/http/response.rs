//! Response relay.
//!
//! # Responsibilities
//! - Copy the upstream status, headers and body to the client response
//! - Build the empty 502 reply for failed dispatches
//! - Build the local health reply
//!
//! # Design Decisions
//! - Every header value is appended in the order received
//! - The body streams through unbuffered; dropping the client response drops
//!   the upstream body and releases its connection

use axum::body::Body;
use axum::http::{HeaderMap, Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::http::headers::strip_hop_by_hop;

/// Relay an upstream response to the client.
pub fn relay(upstream: Response<Body>, strip_hop_headers: bool) -> Response<Body> {
    let (parts, body) = upstream.into_parts();

    let mut headers = HeaderMap::with_capacity(parts.headers.len());
    for (name, value) in parts.headers.iter() {
        headers.append(name, value.clone());
    }
    if strip_hop_headers {
        strip_hop_by_hop(&mut headers);
    }

    let mut response = Response::new(body);
    *response.status_mut() = parts.status;
    *response.headers_mut() = headers;
    response
}

/// `502 Bad Gateway` with an empty body.
pub fn bad_gateway() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
}

/// `200 {"code":"OK","message":"ok"}`.
pub fn health() -> Response<Body> {
    let status = StatusCode::OK;
    let body = serde_json::json!({
        "code": status.canonical_reason().unwrap_or_default(),
        "message": "ok",
    });
    (status, Json(body)).into_response()
}
