//! HMAC request signing and client-side presigned links
//!
//! Both flows are pure: they need only the immutable credentials and the
//! per-call parameters, never the network. The server must reproduce the
//! exact canonical message to verify, so any deviation in method, path or
//! timestamp invalidates a signature.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::api::encode_object_key;
use crate::api::types::PresignedLink;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the timestamp that was folded into the signature
pub const DATE_HEADER: &str = "x-date";

/// Timestamp format for the canonical string-to-sign (UTC, second precision).
/// Second granularity means a fresh signature is computed for every request.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Authentication material for one outgoing request
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    /// `Bearer {access_key}:{signature}`
    pub authorization: String,
    /// The exact timestamp string that was signed
    pub date: String,
}

/// Produces per-request signatures and presigned download tokens
#[derive(Clone)]
pub struct RequestSigner {
    access_key: String,
    secret_key: String,
}

impl RequestSigner {
    pub fn new(access_key: String, secret_key: String) -> Self {
        Self {
            access_key,
            secret_key,
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Sign a request at the current instant.
    ///
    /// `path` excludes the query string; the canonical message is
    /// `METHOD\nPATH\nTIMESTAMP`.
    pub fn sign_request(&self, method: &str, path: &str) -> AuthHeaders {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        self.sign_request_at(method, path, &timestamp)
    }

    /// Sign with an explicit timestamp string (split out so the canonical
    /// construction is testable against golden vectors)
    pub(crate) fn sign_request_at(&self, method: &str, path: &str, timestamp: &str) -> AuthHeaders {
        let message = format!("{}\n{}\n{}", method, path, timestamp);
        let signature = STANDARD.encode(self.hmac(message.as_bytes()));
        AuthHeaders {
            authorization: format!("Bearer {}:{}", self.access_key, signature),
            date: timestamp.to_string(),
        }
    }

    /// Mint a presigned download link expiring `expires_in` seconds from now.
    ///
    /// The token binds method, bucket, key and expiry; swapping any one of
    /// them invalidates it. Minting costs no round trip, and equally no round
    /// trip can revoke the link before expiry: only disabling or rotating the
    /// key does, which invalidates every outstanding link for that key.
    /// `expires_in <= 0` produces an already-expired link; the signer does
    /// not second-guess the caller.
    pub fn presign(
        &self,
        base_url: &str,
        bucket: &str,
        key: &str,
        method: &str,
        expires_in: i64,
    ) -> PresignedLink {
        let expires_at = Utc::now() + Duration::seconds(expires_in);
        self.presign_at(base_url, bucket, key, method, expires_at)
    }

    /// Mint a link with an explicit expiry instant
    pub(crate) fn presign_at(
        &self,
        base_url: &str,
        bucket: &str,
        key: &str,
        method: &str,
        expires_at: DateTime<Utc>,
    ) -> PresignedLink {
        let message = format!(
            "{}\n{}\n{}\n{}",
            method,
            bucket,
            key,
            expires_at.timestamp()
        );
        let token = URL_SAFE_NO_PAD.encode(self.hmac(message.as_bytes()));
        let expires = expires_at.format(TIMESTAMP_FORMAT).to_string();
        let url = format!(
            "{}/api/v1/buckets/{}/{}?token={}&expires={}&access_key={}",
            base_url.trim_end_matches('/'),
            bucket,
            encode_object_key(key),
            token,
            urlencoding::encode(&expires),
            urlencoding::encode(&self.access_key),
        );
        PresignedLink {
            bucket: bucket.to_string(),
            key: key.to_string(),
            method: method.to_string(),
            expires_at,
            token,
            url,
        }
    }

    fn hmac(&self, message: &[u8]) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(message);
        let result = mac.finalize().into_bytes();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        output
    }
}
