//! Integration tests driving the store client against a mock HTTP server

use std::time::Duration;

use bytes::Bytes;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use cubby::api::types::{CreatePrettyLink, ListQuery};
use cubby::api::{StoreClient, StoreError};
use cubby::config::{ClientSettings, Credentials};

fn client_for(server: &ServerGuard) -> StoreClient {
    let settings = ClientSettings {
        base_url: server.url(),
        connect_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(5),
    };
    let credentials = Credentials {
        access_key: "ak_test".to_string(),
        secret_key: "sk_test".to_string(),
    };
    StoreClient::new(settings, credentials)
}

#[tokio::test]
async fn put_then_get_round_trips_bytes() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);
    let body: &[u8] = b"\x89PNG\r\n\x1a\nbinary-payload";

    // Raw upload bytes are sniffed as octet-stream, never JSON
    let put_mock = server
        .mock("PUT", "/api/v1/buckets/docs/report.bin")
        .match_header("content-type", "application/octet-stream")
        .with_status(200)
        .with_body(r#"{"etag":"abc123"}"#)
        .create_async()
        .await;

    let get_mock = server
        .mock("GET", "/api/v1/buckets/docs/report.bin")
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_header("etag", "\"abc123\"")
        .with_body(body)
        .create_async()
        .await;

    let head_mock = server
        .mock("HEAD", "/api/v1/buckets/docs/report.bin")
        .with_status(200)
        .with_header("content-length", &body.len().to_string())
        .with_header("etag", "\"abc123\"")
        .create_async()
        .await;

    let etag = client
        .put_object("docs", "report.bin", Bytes::from_static(body))
        .await
        .unwrap();
    assert_eq!(etag, "abc123");
    put_mock.assert_async().await;

    let content = client.get_object("docs", "report.bin").await.unwrap();
    get_mock.assert_async().await;
    assert_eq!(content.body.unwrap(), Bytes::from_static(body));
    assert_eq!(content.metadata.etag, "abc123");

    let metadata = client.head_object("docs", "report.bin").await.unwrap();
    head_mock.assert_async().await;
    assert_eq!(metadata.content_length, body.len() as u64);
}

#[tokio::test]
async fn every_call_carries_signed_headers() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let mock = server
        .mock("GET", "/api/v1/buckets")
        .match_header(
            "authorization",
            Matcher::Regex(r"^Bearer ak_test:[A-Za-z0-9+/]+=*$".to_string()),
        )
        .match_header(
            "x-date",
            Matcher::Regex(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$".to_string()),
        )
        .with_status(200)
        .with_body(r#"{"buckets":[{"name":"docs"}]}"#)
        .create_async()
        .await;

    let buckets = client.list_buckets().await.unwrap();
    mock.assert_async().await;
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].name, "docs");
}

#[tokio::test]
async fn object_exists_maps_only_404_to_false() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let missing = server
        .mock("HEAD", "/api/v1/buckets/docs/missing.txt")
        .with_status(404)
        .create_async()
        .await;
    assert!(!client.object_exists("docs", "missing.txt").await.unwrap());
    missing.assert_async().await;

    let present = server
        .mock("HEAD", "/api/v1/buckets/docs/present.txt")
        .with_status(200)
        .create_async()
        .await;
    assert!(client.object_exists("docs", "present.txt").await.unwrap());
    present.assert_async().await;

    // A 500 must propagate, never be coerced to false
    let broken = server
        .mock("HEAD", "/api/v1/buckets/docs/broken.txt")
        .with_status(500)
        .create_async()
        .await;
    let err = client.object_exists("docs", "broken.txt").await.unwrap_err();
    broken.assert_async().await;
    assert!(matches!(err, StoreError::Server { status: 500, .. }));
}

#[tokio::test]
async fn bucket_conflicts_are_typed() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let duplicate = server
        .mock("PUT", "/api/v1/buckets/docs")
        .with_status(409)
        .with_body(r#"{"error":{"message":"bucket name already in use"}}"#)
        .create_async()
        .await;
    let err = client.create_bucket("docs").await.unwrap_err();
    duplicate.assert_async().await;
    assert!(
        matches!(err, StoreError::Conflict { ref message, .. } if message == "bucket name already in use")
    );

    // Deleting a non-empty bucket is a conflict, distinct from not-found
    let non_empty = server
        .mock("DELETE", "/api/v1/buckets/docs")
        .with_status(409)
        .with_body(r#"{"error":{"message":"bucket is not empty"}}"#)
        .create_async()
        .await;
    let err = client.delete_bucket("docs").await.unwrap_err();
    non_empty.assert_async().await;
    assert_eq!(err.status(), 409);

    let gone = server
        .mock("DELETE", "/api/v1/buckets/ghost")
        .with_status(404)
        .with_body(r#"{"error":{"message":"no such bucket"}}"#)
        .create_async()
        .await;
    let err = client.delete_bucket("ghost").await.unwrap_err();
    gone.assert_async().await;
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn idempotent_create_reports_existing_bucket() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let mock = server
        .mock("PUT", "/api/v1/buckets/docs")
        .match_query(Matcher::UrlEncoded(
            "createIfNotExists".to_string(),
            "true".to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"existed":true}"#)
        .create_async()
        .await;

    let existed = client.create_bucket_if_not_exists("docs").await.unwrap();
    mock.assert_async().await;
    assert!(existed);
}

#[tokio::test]
async fn locked_and_rate_limited_are_retriable_kinds() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let locked = server
        .mock("PUT", "/api/v1/buckets/docs/hot.txt")
        .with_status(423)
        .with_body(r#"{"error":{"message":"object is locked by another operation"}}"#)
        .create_async()
        .await;
    let err = client
        .put_object("docs", "hot.txt", Bytes::from_static(b"data"))
        .await
        .unwrap_err();
    locked.assert_async().await;
    assert!(matches!(err, StoreError::Locked { .. }));
    assert!(err.is_retriable());

    let throttled = server
        .mock("DELETE", "/api/v1/buckets/docs/hot.txt")
        .with_status(429)
        .with_body(r#"{"message":"slow down"}"#)
        .create_async()
        .await;
    let err = client.delete_object("docs", "hot.txt").await.unwrap_err();
    throttled.assert_async().await;
    assert!(matches!(err, StoreError::RateLimited { .. }));
    assert!(err.is_retriable());
}

#[tokio::test]
async fn list_objects_sends_only_non_default_parameters() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let mock = server
        .mock("GET", "/api/v1/buckets/docs")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("prefix".to_string(), "logs/".to_string()),
            Matcher::UrlEncoded("delimiter".to_string(), "/".to_string()),
            Matcher::UrlEncoded("max-keys".to_string(), "50".to_string()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "objects": [
                    {"key": "logs/2026/app.log", "size": 1024, "etag": "e1"}
                ],
                "commonPrefixes": ["logs/2026/"],
                "prefix": "logs/",
                "delimiter": "/"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let query = ListQuery::default()
        .with_prefix("logs/")
        .with_delimiter("/")
        .with_max_keys(50);
    let listing = client.list_objects("docs", &query).await.unwrap();
    mock.assert_async().await;

    assert_eq!(listing.objects.len(), 1);
    assert_eq!(listing.objects[0].key, "logs/2026/app.log");
    assert_eq!(listing.objects[0].size, 1024);
    assert_eq!(listing.common_prefixes, vec!["logs/2026/".to_string()]);
}

#[tokio::test]
async fn pretty_link_create_then_revoke() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    // Control requests go out as JSON via the first-byte heuristic
    let create = server
        .mock("POST", "/api/v1/presign")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "bucket": "docs",
            "key": "report.pdf",
            "method": "GET",
            "expiresIn": 3600,
            "maxDownloads": 5
        })))
        .with_status(201)
        .with_body(
            json!({
                "token": "tok123",
                "bucket": "docs",
                "key": "report.pdf",
                "method": "GET",
                "expiresAt": "2026-09-01T00:00:00Z",
                "maxDownloads": 5,
                "downloadCount": 0,
                "createdAt": "2026-08-29T00:00:00Z"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let request = CreatePrettyLink::new("docs", "report.pdf")
        .with_expires_in(3600)
        .with_max_downloads(5);
    let link = client.create_pretty_link(&request).await.unwrap();
    create.assert_async().await;

    assert_eq!(link.token, "tok123");
    assert_eq!(link.max_downloads, Some(5));
    assert_eq!(link.download_count, 0);
    assert_eq!(
        client.pretty_link_url(&link.token),
        format!("{}/dl/tok123", server.url())
    );

    // Revocation flips the server-side record; 204 decodes as empty success
    let revoke = server
        .mock("DELETE", "/api/v1/presign/tok123")
        .with_status(204)
        .create_async()
        .await;
    client.revoke_pretty_link("tok123").await.unwrap();
    revoke.assert_async().await;

    let list = server
        .mock("GET", "/api/v1/presign")
        .with_status(200)
        .with_body(r#"{"urls":[]}"#)
        .create_async()
        .await;
    let links = client.list_pretty_links().await.unwrap();
    list.assert_async().await;
    assert!(links.is_empty());
}

#[tokio::test]
async fn expiry_and_download_cap_are_independently_optional() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let mock = server
        .mock("POST", "/api/v1/presign")
        // Exact JSON match: neither expiresIn nor maxDownloads serialized
        // when absent
        .match_body(Matcher::Json(json!({
            "bucket": "docs",
            "key": "a.txt",
            "method": "GET"
        })))
        .with_status(201)
        .with_body(
            json!({
                "token": "tok456",
                "bucket": "docs",
                "key": "a.txt",
                "method": "GET",
                "downloadCount": 0
            })
            .to_string(),
        )
        .create_async()
        .await;

    let link = client
        .create_pretty_link(&CreatePrettyLink::new("docs", "a.txt"))
        .await
        .unwrap();
    mock.assert_async().await;

    assert_eq!(link.token, "tok456");
    assert!(link.expires_at.is_none());
    assert!(link.max_downloads.is_none());
}

#[tokio::test]
async fn redirects_are_followed_within_bound() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let new_location = format!("{}/api/v1/buckets/docs/new.txt", server.url());
    let moved = server
        .mock("GET", "/api/v1/buckets/docs/old.txt")
        .with_status(307)
        .with_header("location", &new_location)
        .create_async()
        .await;
    let target = server
        .mock("GET", "/api/v1/buckets/docs/new.txt")
        .with_status(200)
        .with_body("relocated")
        .create_async()
        .await;

    let content = client.get_object("docs", "old.txt").await.unwrap();
    moved.assert_async().await;
    target.assert_async().await;
    assert_eq!(content.body.unwrap(), Bytes::from_static(b"relocated"));
}

#[tokio::test]
async fn redirect_loops_fail_as_connection_errors() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    // Always points back at itself; the client must fail rather than loop
    server
        .mock("GET", "/api/v1/buckets/docs/loop.txt")
        .with_status(302)
        .with_header("location", "/api/v1/buckets/docs/loop.txt")
        .expect_at_least(4)
        .create_async()
        .await;

    let err = client.get_object("docs", "loop.txt").await.unwrap_err();
    assert!(matches!(err, StoreError::Connection(_)));
    assert_eq!(err.status(), 0);
}

#[tokio::test]
async fn connection_failure_is_not_a_server_error() {
    // Nothing listens here; the exchange never completes
    let settings = ClientSettings {
        base_url: "http://127.0.0.1:1".to_string(),
        connect_timeout: Duration::from_secs(1),
        request_timeout: Duration::from_secs(2),
    };
    let credentials = Credentials {
        access_key: "ak_test".to_string(),
        secret_key: "sk_test".to_string(),
    };
    let client = StoreClient::new(settings, credentials);

    let err = client.bucket_exists("docs").await.unwrap_err();
    assert!(matches!(err, StoreError::Connection(_)));
    assert_eq!(err.status(), 0);
    assert!(err.body().is_none());
}

#[tokio::test]
async fn delete_object_accepts_no_content() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let mock = server
        .mock("DELETE", "/api/v1/buckets/docs/old.txt")
        .with_status(204)
        .create_async()
        .await;

    client.delete_object("docs", "old.txt").await.unwrap();
    mock.assert_async().await;
}
