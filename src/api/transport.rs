//! Single-shot HTTP transport
//!
//! Executes exactly one request/response exchange with signer-provided
//! headers and returns a uniform `(status, headers, body)` triple. Every
//! connection-level problem (DNS, refused, timeout, redirect loop) collapses
//! into `StoreError::Connection`, so callers can always tell "the server said
//! no" apart from "the server never answered".

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use tracing::{debug, warn};

use crate::api::error::{Result, StoreError};

/// Redirect hops tolerated before giving up, for reverse-proxy setups
const MAX_REDIRECTS: usize = 3;

/// One fully-buffered HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Response headers with names normalized to lowercase
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl RawResponse {
    /// Case-insensitive header lookup (names are stored lowercase)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Infer the content type of an outgoing body from its first byte.
///
/// The same send path carries both JSON control requests and raw file bytes,
/// and callers rely on this inference; do not replace it with a per-call
/// parameter without preserving it.
pub fn sniff_content_type(body: &[u8]) -> &'static str {
    match body.first() {
        Some(b'{') | Some(b'[') => "application/json",
        _ => "application/octet-stream",
    }
}

/// HTTP transport with per-call timeout bounds
#[derive(Clone)]
pub struct Transport {
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    request_timeout: Duration,
}

impl Transport {
    /// Create a transport with the given connect and total-request timeouts.
    ///
    /// TCP settings follow the usual client tuning: TCP_NODELAY, keepalive,
    /// and a pooled HTTP/1.1 connection per host.
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        let insecure_tls = std::env::var("CUBBY_INSECURE_TLS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(connect_timeout));
        http.set_keepalive(Some(Duration::from_secs(90)));

        let tls = if insecure_tls {
            warn!("INSECURE TLS MODE ENABLED: Certificate verification is disabled!");
            TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .expect("Failed to build TLS connector")
        } else {
            TlsConnector::new().expect("Failed to build TLS connector")
        };

        let https = HttpsConnector::from((http, tls.into()));

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .set_host(true)
            .build(https);

        Self {
            client,
            request_timeout,
        }
    }

    /// Execute one request, bounded by the total-request timeout.
    ///
    /// For HEAD the body is never read even if the server sends one; all
    /// other responses are buffered fully into memory.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Result<RawResponse> {
        match tokio::time::timeout(
            self.request_timeout,
            self.execute_inner(method, url, headers, body),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Connection(format!(
                "request timed out after {:?}",
                self.request_timeout
            ))),
        }
    }

    async fn execute_inner(
        &self,
        method: Method,
        url: &str,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Result<RawResponse> {
        let mut url = url.to_string();

        for hop in 0..=MAX_REDIRECTS {
            let mut req = Request::builder().method(method.clone()).uri(&url);
            for (key, value) in &headers {
                req = req.header(key, value);
            }
            if !body.is_empty() {
                req = req.header("content-type", sniff_content_type(&body));
                req = req.header("content-length", body.len().to_string());
            }

            let request = req
                .body(Full::new(body.clone()))
                .map_err(|e| StoreError::Connection(format!("request build error: {}", e)))?;

            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| StoreError::Connection(format!("request failed: {}", e)))?;

            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(hyper::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                if let Some(location) = location {
                    // Drain body to return the connection to the pool
                    let _ = response.collect().await;
                    debug!(hop, %location, "following redirect");
                    url = resolve_location(&url, &location);
                    continue;
                }
            }

            let mut header_map = HashMap::new();
            for (name, value) in response.headers() {
                if let Ok(value) = value.to_str() {
                    header_map.insert(name.as_str().to_ascii_lowercase(), value.to_string());
                }
            }

            let body_bytes = if method == Method::HEAD {
                Bytes::new()
            } else {
                response
                    .collect()
                    .await
                    .map_err(|e| StoreError::Connection(format!("body read error: {}", e)))?
                    .to_bytes()
            };

            return Ok(RawResponse {
                status: status.as_u16(),
                headers: header_map,
                body: body_bytes,
            });
        }

        Err(StoreError::Connection(format!(
            "redirect limit exceeded after {} hops",
            MAX_REDIRECTS
        )))
    }
}

/// Resolve a `Location` header value against the current request URL
fn resolve_location(current: &str, location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        return location.to_string();
    }

    // Origin = scheme://authority of the current URL
    let origin_end = current
        .find("://")
        .map(|scheme| {
            current[scheme + 3..]
                .find('/')
                .map(|p| scheme + 3 + p)
                .unwrap_or(current.len())
        })
        .unwrap_or(0);
    let origin = &current[..origin_end];

    if location.starts_with('/') {
        format!("{}{}", origin, location)
    } else {
        // Relative reference: replace the last path segment
        let path = &current[origin_end..];
        let path = path.split('?').next().unwrap_or("");
        let base = path.rsplit_once('/').map(|(b, _)| b).unwrap_or("");
        format!("{}{}/{}", origin, base, location)
    }
}
