//! Command handlers over the store client
//!
//! Each handler performs one client operation and renders the typed result;
//! all policy (what to do with a conflict, when to retry a locked object)
//! stays with the user.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::fs;
use tracing::info;

use crate::api::types::{CreatePrettyLink, ListQuery};
use crate::api::StoreClient;

pub async fn cmd_mb(client: &StoreClient, bucket: &str, if_not_exists: bool) -> Result<()> {
    if if_not_exists {
        let existed = client.create_bucket_if_not_exists(bucket).await?;
        if existed {
            println!("Bucket '{}' already exists", bucket);
        } else {
            println!("Created bucket '{}'", bucket);
        }
    } else {
        client.create_bucket(bucket).await?;
        println!("Created bucket '{}'", bucket);
    }
    Ok(())
}

pub async fn cmd_rb(client: &StoreClient, bucket: &str) -> Result<()> {
    client.delete_bucket(bucket).await?;
    println!("Removed bucket '{}'", bucket);
    Ok(())
}

pub async fn cmd_buckets(client: &StoreClient) -> Result<()> {
    let buckets = client.list_buckets().await?;
    for bucket in &buckets {
        match &bucket.created_at {
            Some(created) => println!("{}  {}", created.format("%Y-%m-%d %H:%M:%S"), bucket.name),
            None => println!("{}", bucket.name),
        }
    }
    info!(count = buckets.len(), "listed buckets");
    Ok(())
}

pub async fn cmd_ls(
    client: &StoreClient,
    bucket: &str,
    prefix: Option<String>,
    delimiter: Option<String>,
    max_keys: u32,
) -> Result<()> {
    let mut query = ListQuery::default().with_max_keys(max_keys);
    if let Some(prefix) = prefix {
        query = query.with_prefix(prefix);
    }
    if let Some(delimiter) = delimiter {
        query = query.with_delimiter(delimiter);
    }

    let listing = client.list_objects(bucket, &query).await?;
    for prefix in &listing.common_prefixes {
        println!("{:>12}  {}", "DIR", prefix);
    }
    for object in &listing.objects {
        println!("{:>12}  {}", object.size, object.key);
    }
    Ok(())
}

pub async fn cmd_put(client: &StoreClient, bucket: &str, key: &str, file: &Path) -> Result<()> {
    let data = fs::read(file)
        .await
        .context(format!("Failed to read file: {:?}", file))?;
    let size = data.len();
    let etag = client.put_object(bucket, key, Bytes::from(data)).await?;
    if etag.is_empty() {
        println!("Uploaded {}/{} ({} bytes)", bucket, key, size);
    } else {
        println!("Uploaded {}/{} ({} bytes, etag {})", bucket, key, size, etag);
    }
    Ok(())
}

pub async fn cmd_get(
    client: &StoreClient,
    bucket: &str,
    key: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let content = client.get_object(bucket, key).await?;
    let body = content.body.unwrap_or_default();

    match output {
        Some(path) => {
            fs::write(&path, &body)
                .await
                .context(format!("Failed to write file: {:?}", path))?;
            println!("Downloaded {}/{} to {:?} ({} bytes)", bucket, key, path, body.len());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&body)?;
        }
    }
    Ok(())
}

pub async fn cmd_rm(client: &StoreClient, bucket: &str, key: &str) -> Result<()> {
    client.delete_object(bucket, key).await?;
    println!("Removed {}/{}", bucket, key);
    Ok(())
}

pub async fn cmd_stat(client: &StoreClient, bucket: &str, key: &str) -> Result<()> {
    let metadata = client.head_object(bucket, key).await?;
    println!("Key:            {}/{}", bucket, key);
    println!("Content-Type:   {}", metadata.content_type);
    println!("Content-Length: {}", metadata.content_length);
    if !metadata.etag.is_empty() {
        println!("ETag:           {}", metadata.etag);
    }
    if !metadata.last_modified.is_empty() {
        println!("Last-Modified:  {}", metadata.last_modified);
    }
    Ok(())
}

pub fn cmd_presign(
    client: &StoreClient,
    bucket: &str,
    key: &str,
    method: &str,
    expires_in: i64,
) -> Result<()> {
    let link = client.presign_download_for(method, bucket, key, expires_in);
    println!("{}", link.url);
    info!(
        bucket,
        key,
        method,
        expires_at = %link.expires_at,
        "minted presigned link"
    );
    Ok(())
}

pub async fn cmd_link_create(
    client: &StoreClient,
    bucket: &str,
    key: &str,
    method: &str,
    expires_in: Option<i64>,
    max_downloads: Option<u32>,
) -> Result<()> {
    let mut request = CreatePrettyLink::new(bucket, key).with_method(method);
    if let Some(seconds) = expires_in {
        request = request.with_expires_in(seconds);
    }
    if let Some(count) = max_downloads {
        request = request.with_max_downloads(count);
    }

    let link = client.create_pretty_link(&request).await?;
    println!("{}", client.pretty_link_url(&link.token));
    match link.expires_at {
        Some(expires) => println!("Expires: {}", expires.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Expires: never"),
    }
    match link.max_downloads {
        Some(max) => println!("Downloads: {}/{}", link.download_count, max),
        None => println!("Downloads: {} (unlimited)", link.download_count),
    }
    Ok(())
}

pub async fn cmd_link_revoke(client: &StoreClient, token: &str) -> Result<()> {
    client.revoke_pretty_link(token).await?;
    println!("Revoked link '{}'", token);
    Ok(())
}

pub async fn cmd_link_ls(client: &StoreClient) -> Result<()> {
    let links = client.list_pretty_links().await?;
    for link in &links {
        let expires = link
            .expires_at
            .map(|e| e.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{}  {}/{}  {}  downloads={}",
            link.token, link.bucket, link.key, expires, link.download_count
        );
    }
    Ok(())
}
