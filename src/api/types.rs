//! Store types and response projections

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for object listings. `max-keys` is omitted from the
/// request query string when a listing asks for exactly this value.
pub const DEFAULT_MAX_KEYS: u32 = 1000;

/// Object metadata derived purely from response headers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// MIME type (`application/octet-stream` when the header is absent)
    pub content_type: String,
    /// Size in bytes (0 when the header is absent or malformed)
    pub content_length: u64,
    /// Content fingerprint with surrounding quotes stripped
    pub etag: String,
    /// Last-modified timestamp as reported by the server (empty when absent)
    pub last_modified: String,
}

impl ObjectMetadata {
    /// Build metadata from a lowercase-keyed response header map
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        Self {
            content_type: headers
                .get("content-type")
                .cloned()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            content_length: headers
                .get("content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            etag: headers
                .get("etag")
                .map(|v| v.trim_matches('"').to_string())
                .unwrap_or_default(),
            last_modified: headers.get("last-modified").cloned().unwrap_or_default(),
        }
    }
}

/// Downloaded object: header-derived metadata plus raw bytes.
/// `body` is `None` for HEAD requests, where the body is never read.
#[derive(Debug, Clone)]
pub struct ObjectContent {
    pub metadata: ObjectMetadata,
    pub body: Option<Bytes>,
}

/// Bucket projection from the listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfo {
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub object_count: Option<u64>,
}

/// Envelope for the bucket listing endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BucketListing {
    #[serde(default)]
    pub buckets: Vec<BucketInfo>,
}

/// One object entry in a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectEntry {
    pub key: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Response from an object listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectListing {
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
    /// Key groupings produced by the server when a delimiter was supplied;
    /// the client never computes grouping itself
    #[serde(default)]
    pub common_prefixes: Vec<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
}

/// Parameters for an object listing. Fields left at their defaults are
/// omitted from the request query string.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub max_keys: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            prefix: None,
            delimiter: None,
            max_keys: DEFAULT_MAX_KEYS,
        }
    }
}

impl ListQuery {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Delimiter is a single character; the server groups keys on it
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = max_keys;
        self
    }
}

/// Locally-computed presigned download link. The token is a pure function of
/// method, bucket, key, expiry and the secret key: it is never registered
/// server-side, cannot be revoked before expiry, and dies with the key.
#[derive(Debug, Clone, Serialize)]
pub struct PresignedLink {
    pub bucket: String,
    pub key: String,
    pub method: String,
    pub expires_at: DateTime<Utc>,
    pub token: String,
    /// Fully-rendered download URL (token, expiry and access key as query
    /// parameters)
    pub url: String,
}

/// Request body for registering a server-side ("pretty") presigned URL.
/// Expiry and download cap are independently optional: an expiry-less or
/// download-unlimited link is a valid state.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrettyLink {
    pub bucket: String,
    pub key: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_downloads: Option<u32>,
}

impl CreatePrettyLink {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            method: "GET".to_string(),
            expires_in: None,
            max_downloads: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    pub fn with_max_downloads(mut self, count: u32) -> Self {
        self.max_downloads = Some(count);
        self
    }
}

/// Server-owned presigned URL record, as projected back by the registry.
/// Unlike client-side links these survive key rotation and can be revoked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrettyLink {
    pub token: String,
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_downloads: Option<u32>,
    #[serde(default)]
    pub download_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Envelope for the pretty-presign listing endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrettyLinkListing {
    #[serde(default)]
    pub urls: Vec<PrettyLink>,
}
