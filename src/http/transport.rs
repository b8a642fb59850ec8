//! Upstream transport.
//!
//! # Responsibilities
//! - Dispatch one outbound request and return the upstream response
//! - Own connection pooling and upstream timeouts
//! - Speak plain HTTP or TLS depending on the target scheme
//!
//! # Design Decisions
//! - A single `round_trip` operation; no retries at this layer
//! - The response body is returned unread, so it streams to the client
//! - Implementations must be safe to share across all in-flight requests

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use std::future::Future;
use std::time::Duration;

use crate::config::TimeoutConfig;

/// Error type for upstream dispatch.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, DNS, or protocol failure reported by the client.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// No response headers within the request timeout.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// The outbound URI cannot be dispatched (missing scheme or authority).
    #[error("invalid upstream target {0:?}")]
    InvalidTarget(String),
}

/// Sends a request upstream and yields the response.
pub trait Transport: Send + Sync + 'static {
    fn round_trip(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, TransportError>> + Send;
}

/// Pooled HTTP/1.1 transport backed by the hyper-util legacy client.
///
/// `https` targets are verified against the bundled webpki roots.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    request_timeout: Duration,
}

impl HyperTransport {
    /// Build a transport from the configured timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);
        connector.enforce_http(false);

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .build(connector);

        Self {
            client,
            request_timeout: Duration::from_secs(timeouts.request_secs),
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(&TimeoutConfig::default())
    }
}

impl Transport for HyperTransport {
    async fn round_trip(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let uri = request.uri();
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(TransportError::InvalidTarget(uri.to_string()));
        }

        let response: Response<Incoming> =
            tokio::time::timeout(self.request_timeout, self.client.request(request))
                .await
                .map_err(|_| TransportError::Timeout(self.request_timeout))??;

        Ok(response.map(Body::new))
    }
}
