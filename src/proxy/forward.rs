//! Forward proxy.
//!
//! The client names the real destination in an absolute-form request URI;
//! the proxy copies the request, appends the client IP to X-Forwarded-For,
//! dispatches it through the shared transport, and streams the upstream
//! response back. A failed dispatch becomes an empty `502 Bad Gateway`.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use std::time::Instant;

use crate::http::headers::{append_forwarded_for, split_host_port, strip_hop_by_hop};
use crate::http::request::{outbound_request, target_host};
use crate::http::response::{bad_gateway, relay};
use crate::http::transport::Transport;
use crate::observability::metrics;

const MODE: &str = "forward";

/// Relays each request to the origin server it names.
#[derive(Debug, Clone)]
pub struct ForwardProxy<T> {
    transport: T,
    strip_hop_by_hop: bool,
}

impl<T: Transport> ForwardProxy<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            strip_hop_by_hop: false,
        }
    }

    /// Remove hop-by-hop headers from relayed requests and responses.
    pub fn with_strip_hop_by_hop(mut self, strip: bool) -> Self {
        self.strip_hop_by_hop = strip;
        self
    }

    /// Proxy one inbound request; `remote_addr` is the peer's `host:port`.
    pub async fn handle(&self, inbound: Request<Body>, remote_addr: &str) -> Response<Body> {
        let start = Instant::now();
        let (parts, body) = inbound.into_parts();

        tracing::info!(
            method = %parts.method,
            host = target_host(&parts),
            remote_addr,
            "Received request"
        );

        let mut headers = parts.headers.clone();
        if self.strip_hop_by_hop {
            strip_hop_by_hop(&mut headers);
        }
        match split_host_port(remote_addr) {
            Some(client_ip) => append_forwarded_for(&mut headers, client_ip),
            None => tracing::debug!(
                remote_addr,
                "No port in remote address, X-Forwarded-For unchanged"
            ),
        }

        let outbound = outbound_request(&parts, headers, body);

        match self.transport.round_trip(outbound).await {
            Ok(upstream) => {
                tracing::debug!(
                    uri = %parts.uri,
                    status = upstream.status().as_u16(),
                    "Upstream responded"
                );
                metrics::record_request(MODE, upstream.status().as_u16(), start);
                relay(upstream, self.strip_hop_by_hop)
            }
            Err(e) => {
                tracing::warn!(uri = %parts.uri, error = %e, "Upstream dispatch failed");
                metrics::record_upstream_error(MODE);
                metrics::record_request(MODE, StatusCode::BAD_GATEWAY.as_u16(), start);
                bad_gateway()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::headers::X_FORWARDED_FOR;
    use crate::http::transport::testing::MockTransport;
    use crate::http::transport::TransportError;
    use axum::body::Bytes;
    use axum::http::{header, Method};
    use futures_util::StreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, "example.com")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_sets_forwarded_for_when_absent() {
        let transport = MockTransport::ok("hello");
        let proxy = ForwardProxy::new(transport.clone());

        let response = proxy.handle(get("http://example.com/"), "192.0.2.7:50123").await;
        assert_eq!(response.status(), StatusCode::OK);

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        let values: Vec<_> = sent[0].headers.get_all(&X_FORWARDED_FOR).iter().collect();
        assert_eq!(values, vec!["192.0.2.7"]);
    }

    #[tokio::test]
    async fn test_appends_to_existing_forwarded_for() {
        let transport = MockTransport::ok("hello");
        let proxy = ForwardProxy::new(transport.clone());

        let request = Request::builder()
            .uri("http://example.com/")
            .header("x-forwarded-for", "203.0.113.1")
            .header("x-forwarded-for", "203.0.113.2")
            .body(Body::empty())
            .unwrap();
        proxy.handle(request, "[2001:db8::5]:443").await;

        let sent = transport.requests();
        let values: Vec<_> = sent[0].headers.get_all(&X_FORWARDED_FOR).iter().collect();
        assert_eq!(values, vec!["203.0.113.1, 203.0.113.2, 2001:db8::5"]);
    }

    #[tokio::test]
    async fn test_unparsable_remote_addr_still_dispatches() {
        let transport = MockTransport::ok("hello");
        let proxy = ForwardProxy::new(transport.clone());

        let response = proxy.handle(get("http://example.com/a"), "192.0.2.7").await;
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .uri("http://example.com/b")
            .header("x-forwarded-for", "203.0.113.1")
            .body(Body::empty())
            .unwrap();
        proxy.handle(request, "not-an-address").await;

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert!(!sent[0].headers.contains_key(&X_FORWARDED_FOR));
        let values: Vec<_> = sent[1].headers.get_all(&X_FORWARDED_FOR).iter().collect();
        assert_eq!(values, vec!["203.0.113.1"]);
    }

    #[tokio::test]
    async fn test_outbound_copies_method_uri_headers_and_body() {
        let transport = MockTransport::ok("stored");
        let proxy = ForwardProxy::new(transport.clone());

        let request = Request::builder()
            .method(Method::PUT)
            .uri("http://example.com/items/7?force=true")
            .header(header::HOST, "example.com")
            .header("x-trace", "one")
            .header("x-trace", "two")
            .body(Body::from("item body"))
            .unwrap();
        proxy.handle(request, "127.0.0.1:40000").await;

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::PUT);
        assert_eq!(sent.uri, "http://example.com/items/7?force=true");
        assert_eq!(sent.headers[header::HOST], "example.com");
        let traces: Vec<_> = sent.headers.get_all("x-trace").iter().collect();
        assert_eq!(traces, vec!["one", "two"]);
        assert_eq!(sent.body, b"item body");
    }

    #[tokio::test]
    async fn test_relays_upstream_response() {
        let transport = MockTransport::new(|| {
            Ok(Response::builder()
                .status(StatusCode::IM_A_TEAPOT)
                .header("set-cookie", "a=1")
                .header("set-cookie", "b=2")
                .header("x-backend", "origin")
                .body(Body::from("short and stout"))
                .unwrap())
        });
        let proxy = ForwardProxy::new(transport);

        let response = proxy.handle(get("http://example.com/"), "127.0.0.1:40000").await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let cookies: Vec<_> = response.headers().get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(response.headers()["x-backend"], "origin");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"short and stout");
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_bad_gateway() {
        let transport = MockTransport::failing();
        let proxy = ForwardProxy::new(transport.clone());

        let response = proxy.handle(get("http://unreachable.invalid/"), "127.0.0.1:40000").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
        // No retry.
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_target_is_bad_gateway() {
        let transport =
            MockTransport::new(|| Err(TransportError::InvalidTarget("/relative".into())));
        let proxy = ForwardProxy::new(transport);

        let response = proxy.handle(get("/relative"), "127.0.0.1:40000").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn streaming_transport(released: Arc<AtomicBool>) -> MockTransport {
        MockTransport::new(move || {
            let guard = DropFlag(released.clone());
            let chunks = vec![
                Ok::<_, std::io::Error>(Bytes::from_static(b"chunk-1 ")),
                Ok(Bytes::from_static(b"chunk-2")),
            ];
            let stream = futures_util::stream::iter(chunks).map(move |chunk| {
                let _held = &guard;
                chunk
            });
            Ok(Response::new(Body::from_stream(stream)))
        })
    }

    #[tokio::test]
    async fn test_upstream_body_released_after_drain() {
        let released = Arc::new(AtomicBool::new(false));
        let proxy = ForwardProxy::new(streaming_transport(released.clone()));

        let response = proxy.handle(get("http://example.com/"), "127.0.0.1:40000").await;
        assert!(!released.load(Ordering::SeqCst));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"chunk-1 chunk-2");
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_upstream_body_released_when_client_goes_away() {
        let released = Arc::new(AtomicBool::new(false));
        let proxy = ForwardProxy::new(streaming_transport(released.clone()));

        let response = proxy.handle(get("http://example.com/"), "127.0.0.1:40000").await;
        assert!(!released.load(Ordering::SeqCst));

        drop(response);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_strip_hop_by_hop_option() {
        let transport = MockTransport::ok("ok");
        let proxy = ForwardProxy::new(transport.clone()).with_strip_hop_by_hop(true);

        let request = Request::builder()
            .uri("http://example.com/")
            .header(header::CONNECTION, "keep-alive")
            .header("keep-alive", "timeout=5")
            .header("proxy-authorization", "Basic Zm9vOmJhcg==")
            .header("accept", "*/*")
            .body(Body::empty())
            .unwrap();
        proxy.handle(request, "127.0.0.1:40000").await;

        let sent = &transport.requests()[0];
        assert!(!sent.headers.contains_key(header::CONNECTION));
        assert!(!sent.headers.contains_key("keep-alive"));
        assert!(!sent.headers.contains_key("proxy-authorization"));
        assert_eq!(sent.headers["accept"], "*/*");
        assert_eq!(sent.headers[&X_FORWARDED_FOR], "127.0.0.1");
    }

    #[tokio::test]
    async fn test_hop_by_hop_kept_by_default() {
        let transport = MockTransport::ok("ok");
        let proxy = ForwardProxy::new(transport.clone());

        let request = Request::builder()
            .uri("http://example.com/")
            .header(header::CONNECTION, "keep-alive")
            .body(Body::empty())
            .unwrap();
        proxy.handle(request, "127.0.0.1:40000").await;

        assert_eq!(transport.requests()[0].headers[header::CONNECTION], "keep-alive");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_are_isolated() {
        let transport = MockTransport::ok("ok");
        let proxy = Arc::new(ForwardProxy::new(transport.clone()));

        let mut tasks = Vec::new();
        for i in 0..32u8 {
            let proxy = proxy.clone();
            tasks.push(tokio::spawn(async move {
                let request = Request::builder()
                    .uri(format!("http://example.com/{}", i))
                    .header("x-forwarded-for", format!("198.51.100.{}", i))
                    .body(Body::empty())
                    .unwrap();
                proxy.handle(request, &format!("10.0.0.{}:5000", i)).await
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().status(), StatusCode::OK);
        }

        let sent = transport.requests();
        assert_eq!(sent.len(), 32);
        for request in sent {
            let i: u8 = request.uri.path().trim_start_matches('/').parse().unwrap();
            let values: Vec<_> = request.headers.get_all(&X_FORWARDED_FOR).iter().collect();
            assert_eq!(values, vec![format!("198.51.100.{}, 10.0.0.{}", i, i).as_str()]);
        }
    }
}
