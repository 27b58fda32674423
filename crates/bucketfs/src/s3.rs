// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! S3 backend on `rust-s3`. Keys go on the wire exactly as given; user
//! metadata travels as `x-amz-meta-*` headers.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use object_store::Attributes;
use s3::bucket::Bucket as S3Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::{DEFAULT_CONTENT_TYPE, split_attributes};
use crate::store::{Children, ObjectBackend, ObjectRecord, StoreResult};

const STORE: &str = "S3";
const META_PREFIX: &str = "x-amz-meta-";
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct S3Backend {
    bucket: Box<S3Bucket>,
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S3Backend{{{}}}", self.bucket.name())
    }
}

impl S3Backend {
    /// Builds a client for the bucket in `config`. No request is made.
    pub fn connect(config: &Config) -> Result<Self> {
        let bucket_name = config.bucket_name.as_str();
        let region_name = config.region.as_str();
        diagnostics::log_info!("Bucket: {bucket_name}, region: {region_name}", bucket_name: bucket_name, region_name: region_name);

        let endpoint = config
            .endpoint_url()
            .unwrap_or_else(|| format!("https://s3.{region_name}.amazonaws.com"));
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint,
        };

        let credentials = if config.access_key_id.is_empty() {
            Credentials::new(None, None, None, None, None)
        } else {
            Credentials::new(
                Some(config.access_key_id.as_str()),
                Some(config.secret_access_key.as_str()),
                None,
                None,
                None,
            )
        }
        .map_err(|e| Error::config(format!("Invalid S3 credentials: {e}")))?;

        let bucket = S3Bucket::new(bucket_name, region, credentials)
            .map_err(|e| Error::config(format!("Failed to build S3 client: {e}")))?;
        // Non-AWS endpoints generally need path-style requests.
        let mut bucket: Box<S3Bucket> = if config.endpoint.is_empty() {
            Box::from(bucket)
        } else {
            Box::from(bucket.with_path_style())
        };
        bucket.set_request_timeout(Some(CLIENT_TIMEOUT));
        Ok(Self { bucket })
    }

    /// Directory key to the listing prefix S3 expects.
    fn prefix(prefix: Option<&str>) -> String {
        prefix.map(|p| format!("{p}/")).unwrap_or_default()
    }

    async fn list_all(
        bucket: &S3Bucket,
        prefix: String,
        delimiter: Option<String>,
    ) -> StoreResult<(Vec<ObjectRecord>, Vec<String>)> {
        let pages = bucket
            .list(prefix.clone(), delimiter)
            .await
            .map_err(|e| generic(&prefix, e))?;

        let mut objects = Vec::new();
        let mut prefixes = Vec::new();
        for page in pages {
            for object in page.contents {
                objects.push(ObjectRecord {
                    last_modified: parse_time(Some(object.last_modified.as_str())),
                    key: object.key,
                    size: object.size,
                    metadata: HashMap::new(),
                    content_type: None,
                });
            }
            for common in page.common_prefixes.unwrap_or_default() {
                prefixes.push(common.prefix.trim_end_matches('/').to_string());
            }
        }
        Ok((objects, prefixes))
    }
}

/// Rejects keys an HTTP path cannot carry: URL parsing folds `.` and `..`
/// segments away, so such an object would land under a different key.
pub(crate) fn wire_key(key: &str) -> StoreResult<&str> {
    if key.split('/').any(|segment| matches!(segment, "." | "..")) {
        return Err(object_store::Error::Generic {
            store: STORE,
            source: format!("key {key} has a dot segment and cannot be addressed over HTTP")
                .into(),
        });
    }
    Ok(key)
}

fn generic<E>(key: &str, source: E) -> object_store::Error
where
    E: std::fmt::Display,
{
    object_store::Error::Generic {
        store: STORE,
        source: format!("{key}: {source}").into(),
    }
}

/// Maps a response status onto the store error classes.
fn check_status(key: &str, status: u16, body: &[u8]) -> StoreResult<()> {
    match status {
        200..=299 => Ok(()),
        404 => Err(object_store::Error::NotFound {
            path: key.to_string(),
            source: format!("status {status}").into(),
        }),
        _ => Err(generic(
            key,
            format!("status {status}: {}", String::from_utf8_lossy(body)),
        )),
    }
}

/// S3 sends RFC 2822 dates in headers and RFC 3339 dates in listings.
fn parse_time(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|v| {
            DateTime::parse_from_rfc2822(v)
                .or_else(|_| DateTime::parse_from_rfc3339(v))
                .ok()
        })
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

fn user_metadata(headers: Option<HashMap<String, String>>) -> HashMap<String, String> {
    headers
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let name = name.to_ascii_lowercase();
            let name = name.strip_prefix(META_PREFIX).unwrap_or(&name).to_string();
            (name, value)
        })
        .collect()
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn head(&self, key: &str) -> StoreResult<ObjectRecord> {
        let (head, status) = self
            .bucket
            .head_object(wire_key(key)?)
            .await
            .map_err(|e| generic(key, e))?;
        check_status(key, status, &[])?;
        Ok(ObjectRecord {
            key: key.to_string(),
            size: head
                .content_length
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or_default(),
            last_modified: parse_time(head.last_modified.as_deref()),
            metadata: user_metadata(head.metadata),
            content_type: head.content_type,
        })
    }

    async fn get(&self, key: &str) -> StoreResult<BoxStream<'static, StoreResult<Bytes>>> {
        let response = self
            .bucket
            .get_object(wire_key(key)?)
            .await
            .map_err(|e| generic(key, e))?;
        check_status(key, response.status_code(), response.as_slice())?;
        let data = Bytes::copy_from_slice(response.as_slice());
        Ok(stream::iter(vec![Ok(data)]).boxed())
    }

    async fn put(&self, key: &str, data: Bytes, attributes: Attributes) -> StoreResult<()> {
        let (metadata, content_type) = split_attributes(&attributes);
        let mut bucket = self.bucket.clone();
        for (name, value) in &metadata {
            bucket.add_header(&format!("{META_PREFIX}{name}"), value);
        }
        let content_type = content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
        let response = bucket
            .put_object_with_content_type(wire_key(key)?, &data, content_type)
            .await
            .map_err(|e| generic(key, e))?;
        check_status(key, response.status_code(), response.as_slice())
    }

    /// Buffers the whole body, then uploads it in one request; nothing is
    /// written if the reader fails.
    async fn put_reader(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        attributes: Attributes,
    ) -> std::io::Result<u64> {
        let mut data = Vec::new();
        let copied = reader.read_to_end(&mut data).await?;
        self.put(key, Bytes::from(data), attributes)
            .await
            .map_err(std::io::Error::other)?;
        Ok(copied as u64)
    }

    fn list(&self, prefix: Option<&str>) -> BoxStream<'static, StoreResult<ObjectRecord>> {
        let bucket = self.bucket.clone();
        let prefix = Self::prefix(prefix);
        stream::once(async move { Self::list_all(&bucket, prefix, None).await })
            .flat_map(|listing| {
                let items: Vec<StoreResult<ObjectRecord>> = match listing {
                    Ok((objects, _)) => objects.into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
                stream::iter(items)
            })
            .boxed()
    }

    async fn list_children(&self, prefix: Option<&str>) -> StoreResult<Children> {
        let (objects, prefixes) =
            Self::list_all(&self.bucket, Self::prefix(prefix), Some("/".to_string())).await?;
        Ok(Children { objects, prefixes })
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let response = self
            .bucket
            .delete_object(wire_key(key)?)
            .await
            .map_err(|e| generic(key, e))?;
        check_status(key, response.status_code(), response.as_slice())
    }

    async fn copy(&self, from: &str, to: &str) -> StoreResult<()> {
        let status = self
            .bucket
            .copy_object_internal(wire_key(from)?, wire_key(to)?)
            .await
            .map_err(|e| generic(from, e))?;
        check_status(from, status, &[])
    }
}
