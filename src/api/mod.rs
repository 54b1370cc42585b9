//! Signed store client
//!
//! This module provides:
//! - Per-request HMAC-SHA256 signing and client-side presigned links
//! - A single-shot HTTP transport with timeout and redirect bounds
//! - Response decoding into typed results and a status-tagged error enum
//! - The public bucket/object/presign operation set

pub mod client;
pub mod decode;
pub mod error;
pub mod signer;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::StoreClient;
pub use error::{Result, StoreError};
pub use signer::RequestSigner;
pub use types::{
    BucketInfo, CreatePrettyLink, ListQuery, ObjectContent, ObjectEntry, ObjectListing,
    ObjectMetadata, PresignedLink, PrettyLink,
};

/// Percent-encode an object key for use in a request path, preserving the
/// slashes that delimit key segments.
pub(crate) fn encode_object_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
