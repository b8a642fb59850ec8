//! Header manipulation.
//!
//! # Responsibilities
//! - Extract the client host from a `host:port` peer address
//! - Append the client IP to X-Forwarded-For
//! - Strip hop-by-hop headers
//!
//! # Design Decisions
//! - X-Forwarded-For is appended, never replaced
//! - Prior values are folded into one comma-space separated value
//! - An unparsable peer address is not an error; the header is left alone

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// `X-Forwarded-For` header name.
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// `X-Request-Id` header name.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Headers that only apply to a single transport-level connection.
const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Split a `host:port` address and return the host.
///
/// IPv6 hosts must be bracketed (`[::1]:8080`) and come back without brackets.
/// Returns `None` when the port is missing or the address is malformed.
pub fn split_host_port(addr: &str) -> Option<&str> {
    let colon = addr.rfind(':')?;

    let host = if let Some(rest) = addr.strip_prefix('[') {
        let close = rest.find(']')?;
        // "]" must be immediately followed by the last colon.
        if close + 2 != colon {
            return None;
        }
        &rest[..close]
    } else {
        let host = &addr[..colon];
        if host.contains(':') {
            return None;
        }
        host
    };

    let port = &addr[colon + 1..];
    if host.contains(['[', ']']) || port.contains(['[', ']']) {
        return None;
    }

    Some(host)
}

/// Append `client_ip` to the X-Forwarded-For chain in `headers`.
///
/// Existing values are joined with `", "` and the new address goes last;
/// afterwards the header holds exactly one value.
pub fn append_forwarded_for(headers: &mut HeaderMap, client_ip: &str) {
    let mut chain: Vec<u8> = Vec::new();
    for prior in headers.get_all(&X_FORWARDED_FOR) {
        chain.extend_from_slice(prior.as_bytes());
        chain.extend_from_slice(b", ");
    }
    chain.extend_from_slice(client_ip.as_bytes());

    match HeaderValue::from_bytes(&chain) {
        Ok(value) => {
            headers.insert(X_FORWARDED_FOR, value);
        }
        Err(_) => {
            tracing::debug!(client_ip, "Skipping X-Forwarded-For: not a valid header value");
        }
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
