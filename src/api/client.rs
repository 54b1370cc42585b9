//! Store client implementation
//!
//! The public operation set over the store's HTTP surface. Every operation
//! signs via the request signer, sends via the transport, and classifies the
//! response via the decoder; callers only ever see typed results or typed
//! errors. The client holds no mutable state between calls, so one instance
//! can be shared freely across concurrent callers.

use bytes::Bytes;
use hyper::Method;
use serde_json::Value;
use tracing::debug;

use crate::api::decode;
use crate::api::encode_object_key;
use crate::api::error::Result;
use crate::api::signer::{RequestSigner, DATE_HEADER};
use crate::api::transport::{RawResponse, Transport};
use crate::api::types::{
    BucketInfo, BucketListing, CreatePrettyLink, ListQuery, ObjectContent, ObjectListing,
    ObjectMetadata, PresignedLink, PrettyLink, PrettyLinkListing, DEFAULT_MAX_KEYS,
};
use crate::config::{ClientSettings, Credentials};

/// Signed client for one store endpoint.
///
/// Clone is cheap - the underlying HTTP client uses Arc internally.
#[derive(Clone)]
pub struct StoreClient {
    signer: RequestSigner,
    transport: Transport,
    base_url: String,
}

impl StoreClient {
    pub fn new(settings: ClientSettings, credentials: Credentials) -> Self {
        let transport = Transport::new(settings.connect_timeout, settings.request_timeout);
        Self {
            signer: RequestSigner::new(credentials.access_key, credentials.secret_key),
            transport,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign and send one request. `path` is the canonical signed path and
    /// excludes `query`, which is appended to the URL only.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &str,
        body: Bytes,
    ) -> Result<RawResponse> {
        let auth = self.signer.sign_request(method.as_str(), path);
        let headers = vec![
            ("authorization".to_string(), auth.authorization),
            (DATE_HEADER.to_string(), auth.date),
        ];
        let url = format!("{}{}{}", self.base_url, path, query);
        self.transport.execute(method, &url, headers, body).await
    }

    async fn call_structured(
        &self,
        method: Method,
        path: &str,
        query: &str,
        body: Bytes,
    ) -> Result<Value> {
        let resp = self.send(method, path, query, body).await?;
        decode::decode_structured(resp)
    }

    /// Only 404 means "does not exist"; every other failure propagates
    fn exists_from_status(resp: RawResponse) -> Result<bool> {
        match resp.status {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(decode::error_from_status(status, &resp.body)),
        }
    }

    fn object_path(&self, bucket: &str, key: &str) -> String {
        format!("/api/v1/buckets/{}/{}", bucket, encode_object_key(key))
    }

    // -------------------------------------------------------------------------
    // Bucket operations
    // -------------------------------------------------------------------------

    /// Create a bucket. A name already in use surfaces as `Conflict`.
    pub async fn create_bucket(&self, name: &str) -> Result<()> {
        debug!(bucket = name, "creating bucket");
        self.call_structured(
            Method::PUT,
            &format!("/api/v1/buckets/{}", name),
            "",
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    /// Idempotent bucket creation. Returns `true` when the bucket already
    /// existed (the server maps this to 200 with an exists flag instead of
    /// 409).
    pub async fn create_bucket_if_not_exists(&self, name: &str) -> Result<bool> {
        debug!(bucket = name, "creating bucket (if not exists)");
        let payload = self
            .call_structured(
                Method::PUT,
                &format!("/api/v1/buckets/{}", name),
                "?createIfNotExists=true",
                Bytes::new(),
            )
            .await?;
        Ok(payload
            .get("existed")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// Delete a bucket. Only valid on an empty bucket; a non-empty bucket
    /// surfaces as `Conflict`, distinct from `NotFound`.
    pub async fn delete_bucket(&self, name: &str) -> Result<()> {
        debug!(bucket = name, "deleting bucket");
        self.call_structured(
            Method::DELETE,
            &format!("/api/v1/buckets/{}", name),
            "",
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    pub async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let payload = self
            .call_structured(Method::GET, "/api/v1/buckets", "", Bytes::new())
            .await?;
        let listing: BucketListing = serde_json::from_value(payload).unwrap_or_default();
        Ok(listing.buckets)
    }

    pub async fn bucket_exists(&self, name: &str) -> Result<bool> {
        let resp = self
            .send(
                Method::HEAD,
                &format!("/api/v1/buckets/{}", name),
                "",
                Bytes::new(),
            )
            .await?;
        Self::exists_from_status(resp)
    }

    // -------------------------------------------------------------------------
    // Object operations
    // -------------------------------------------------------------------------

    /// Upload raw object bytes. Returns the server-reported etag (empty when
    /// the server did not include one).
    pub async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<String> {
        debug!(bucket, key, size = data.len(), "putting object");
        let payload = self
            .call_structured(Method::PUT, &self.object_path(bucket, key), "", data)
            .await?;
        Ok(payload
            .get("etag")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Download an object with its header-derived metadata
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectContent> {
        debug!(bucket, key, "getting object");
        let resp = self
            .send(Method::GET, &self.object_path(bucket, key), "", Bytes::new())
            .await?;
        decode::decode_content(resp, false)
    }

    /// Fetch object metadata without the body
    pub async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        let resp = self
            .send(Method::HEAD, &self.object_path(bucket, key), "", Bytes::new())
            .await?;
        decode::decode_content(resp, true).map(|content| content.metadata)
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        debug!(bucket, key, "deleting object");
        self.call_structured(Method::DELETE, &self.object_path(bucket, key), "", Bytes::new())
            .await?;
        Ok(())
    }

    pub async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let resp = self
            .send(Method::HEAD, &self.object_path(bucket, key), "", Bytes::new())
            .await?;
        Self::exists_from_status(resp)
    }

    /// List objects in a bucket. Parameters at their defaults are omitted
    /// from the query string; grouping under a delimiter is computed by the
    /// server, never client-side.
    pub async fn list_objects(&self, bucket: &str, query: &ListQuery) -> Result<ObjectListing> {
        let qs = Self::list_query_string(query);
        let payload = self
            .call_structured(
                Method::GET,
                &format!("/api/v1/buckets/{}", bucket),
                &qs,
                Bytes::new(),
            )
            .await?;
        Ok(serde_json::from_value(payload).unwrap_or_default())
    }

    /// Render the listing query string, omitting parameters left at their
    /// defaults (empty string when nothing differs)
    fn list_query_string(query: &ListQuery) -> String {
        let mut parts = Vec::new();
        if let Some(prefix) = &query.prefix {
            parts.push(format!("prefix={}", urlencoding::encode(prefix)));
        }
        if let Some(delimiter) = &query.delimiter {
            parts.push(format!("delimiter={}", urlencoding::encode(delimiter)));
        }
        if query.max_keys != DEFAULT_MAX_KEYS {
            parts.push(format!("max-keys={}", query.max_keys));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("?{}", parts.join("&"))
        }
    }

    // -------------------------------------------------------------------------
    // Presigned links
    // -------------------------------------------------------------------------

    /// Mint a client-side presigned GET link expiring `expires_in` seconds
    /// from now. Pure computation, no round trip.
    pub fn presign_download(&self, bucket: &str, key: &str, expires_in: i64) -> PresignedLink {
        self.presign_download_for("GET", bucket, key, expires_in)
    }

    /// Mint a client-side presigned link for an explicit method
    pub fn presign_download_for(
        &self,
        method: &str,
        bucket: &str,
        key: &str,
        expires_in: i64,
    ) -> PresignedLink {
        self.signer
            .presign(&self.base_url, bucket, key, method, expires_in)
    }

    /// Register a server-side ("pretty") presigned URL. The returned record
    /// is server state: it survives key rotation and can be revoked.
    pub async fn create_pretty_link(&self, request: &CreatePrettyLink) -> Result<PrettyLink> {
        debug!(bucket = %request.bucket, key = %request.key, "registering pretty link");
        let body = serde_json::to_vec(request).expect("presign request serializes to JSON");
        let payload = self
            .call_structured(Method::POST, "/api/v1/presign", "", Bytes::from(body))
            .await?;
        Ok(serde_json::from_value(payload).unwrap_or_default())
    }

    /// Revoke a pretty link; its `/dl/{token}` URL turns not-found
    /// immediately
    pub async fn revoke_pretty_link(&self, token: &str) -> Result<()> {
        debug!(token, "revoking pretty link");
        self.call_structured(
            Method::DELETE,
            &format!("/api/v1/presign/{}", urlencoding::encode(token)),
            "",
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    pub async fn list_pretty_links(&self) -> Result<Vec<PrettyLink>> {
        let payload = self
            .call_structured(Method::GET, "/api/v1/presign", "", Bytes::new())
            .await?;
        let listing: PrettyLinkListing = serde_json::from_value(payload).unwrap_or_default();
        Ok(listing.urls)
    }

    /// Download URL the server resolves for a pretty link token
    pub fn pretty_link_url(&self, token: &str) -> String {
        format!("{}/dl/{}", self.base_url, urlencoding::encode(token))
    }
}
