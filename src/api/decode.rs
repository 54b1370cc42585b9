//! Response classification
//!
//! Two decoding modes, selected by the calling operation: structured mode for
//! JSON envelopes (buckets, presign registry) and raw-content mode for object
//! downloads and metadata. Both build the typed error exactly once from the
//! status code; connection failures never reach this module.

use serde_json::Value;

use crate::api::error::{Result, StoreError};
use crate::api::transport::RawResponse;
use crate::api::types::{ObjectContent, ObjectMetadata};

/// Decode a structured (JSON-envelope) response.
///
/// 204 yields an empty payload. A 2xx body that fails to parse as JSON also
/// yields the empty payload rather than failing the call.
pub fn decode_structured(resp: RawResponse) -> Result<Value> {
    if resp.status == 204 {
        return Ok(Value::Null);
    }
    if !(200..300).contains(&resp.status) {
        return Err(error_from_status(resp.status, &resp.body));
    }
    Ok(serde_json::from_slice(&resp.body).unwrap_or(Value::Null))
}

/// Decode a raw-content response (object download or metadata HEAD).
///
/// Metadata comes purely from headers; the body is attached only when the
/// request was not a HEAD.
pub fn decode_content(resp: RawResponse, head: bool) -> Result<ObjectContent> {
    if !(200..300).contains(&resp.status) {
        return Err(error_from_status(resp.status, &resp.body));
    }
    let metadata = ObjectMetadata::from_headers(&resp.headers);
    let body = if head { None } else { Some(resp.body) };
    Ok(ObjectContent { metadata, body })
}

/// Build the typed error for a non-2xx status.
///
/// The human-readable message comes from `error.message`, then top-level
/// `message`, then a generic fallback when the body is not JSON at all. The
/// parsed body rides along for programmatic inspection.
pub(crate) fn error_from_status(status: u16, body: &[u8]) -> StoreError {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    let message = parsed
        .as_ref()
        .and_then(extract_message)
        .unwrap_or_else(|| format!("request failed with status {}", status));

    match status {
        404 => StoreError::NotFound {
            message,
            body: parsed,
        },
        409 => StoreError::Conflict {
            message,
            body: parsed,
        },
        423 => StoreError::Locked {
            message,
            body: parsed,
        },
        429 => StoreError::RateLimited {
            message,
            body: parsed,
        },
        _ => StoreError::Server {
            status,
            message,
            body: parsed,
        },
    }
}

fn extract_message(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .map(str::to_string)
}
