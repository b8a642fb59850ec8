//! Outbound request construction.
//!
//! # Responsibilities
//! - Build the upstream copy of an inbound request
//! - Keep the inbound request metadata intact for logging
//!
//! # Design Decisions
//! - Method and URI are copied; the header map is passed in already cloned
//!   so header edits never reach the inbound request
//! - The body stream is moved, never buffered or duplicated
//! - Extensions and HTTP version are not carried upstream

use axum::body::Body;
use axum::http::{request::Parts, HeaderMap, Request};

/// Build the outbound request from inbound metadata, an owned header map,
/// and the inbound body.
pub fn outbound_request(parts: &Parts, headers: HeaderMap, body: Body) -> Request<Body> {
    let mut outbound = Request::new(body);
    *outbound.method_mut() = parts.method.clone();
    *outbound.uri_mut() = parts.uri.clone();
    *outbound.headers_mut() = headers;
    outbound
}

/// Destination host of a request: URI authority, else the `Host` header.
pub fn target_host(parts: &Parts) -> &str {
    parts
        .uri
        .authority()
        .map(|a| a.as_str())
        .or_else(|| {
            parts
                .headers
                .get(axum::http::header::HOST)
                .and_then(|h| h.to_str().ok())
        })
        .unwrap_or("")
}
