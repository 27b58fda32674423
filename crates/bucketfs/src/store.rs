// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The storage seam: one bucket, addressed by raw string keys.
//!
//! Keys are the normalized strings produced by `PathNormalizer` and are
//! handed to the backend unchanged. `S3Backend` sends them as-is;
//! `ObjectStoreBackend` adapts them to `object_store` locations, which
//! percent-encode some segments internally and decode them on the way out.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::{Attributes, GetOptions, ObjectMeta, ObjectStore, PutOptions, PutPayload};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::metadata::{MODE_KEY, ModeField, split_attributes};

pub type StoreResult<T> = std::result::Result<T, object_store::Error>;

/// Deletes kept in flight by the default `delete_stream`.
const DELETE_CONCURRENCY: usize = 10;

/// One stored object as seen through a stat or a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// User metadata; always empty for records produced by a listing.
    pub metadata: HashMap<String, String>,
    pub content_type: Option<String>,
}

impl ObjectRecord {
    fn from_meta(meta: ObjectMeta, attributes: &Attributes) -> Self {
        let (metadata, content_type) = split_attributes(attributes);
        Self {
            key: location_to_key(&meta.location),
            size: meta.size,
            last_modified: meta.last_modified,
            metadata,
            content_type,
        }
    }

    pub(crate) fn from_listing(meta: ObjectMeta) -> Self {
        Self::from_meta(meta, &Attributes::new())
    }

    #[must_use]
    pub fn mode_field(&self) -> ModeField {
        ModeField::decode(self.metadata.get(MODE_KEY).map(String::as_str))
    }
}

/// Immediate children of a prefix.
#[derive(Debug, Default)]
pub struct Children {
    /// Objects stored directly under the prefix.
    pub objects: Vec<ObjectRecord>,
    /// Keys of deeper prefixes, without a trailing separator.
    pub prefixes: Vec<String>,
}

impl Children {
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len() + self.prefixes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A flat key/value bucket.
///
/// Prefix arguments are directory keys without a trailing separator;
/// `None` means the whole bucket.
#[async_trait]
pub trait ObjectBackend: Send + Sync + std::fmt::Debug {
    /// Size, timestamp and metadata of one object, without its body.
    async fn head(&self, key: &str) -> StoreResult<ObjectRecord>;

    /// Streams the body of one object.
    async fn get(&self, key: &str) -> StoreResult<BoxStream<'static, StoreResult<Bytes>>>;

    async fn put(&self, key: &str, data: Bytes, attributes: Attributes) -> StoreResult<()>;

    /// Uploads everything `reader` yields. A reader failure must leave no
    /// object behind.
    async fn put_reader(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        attributes: Attributes,
    ) -> std::io::Result<u64>;

    /// Every object below `prefix`, recursively.
    fn list(&self, prefix: Option<&str>) -> BoxStream<'static, StoreResult<ObjectRecord>>;

    /// Objects and sub-prefixes directly below `prefix`.
    async fn list_children(&self, prefix: Option<&str>) -> StoreResult<Children>;

    async fn delete(&self, key: &str) -> StoreResult<()>;

    async fn copy(&self, from: &str, to: &str) -> StoreResult<()>;

    /// Deletes every key the stream yields, reporting one result per key
    /// in any order.
    fn delete_stream<'a>(
        &'a self,
        keys: BoxStream<'a, StoreResult<String>>,
    ) -> BoxStream<'a, StoreResult<String>> {
        keys.map(move |key| async move {
            let key = key?;
            self.delete(&key).await?;
            Ok::<_, object_store::Error>(key)
        })
        .buffered(DELETE_CONCURRENCY)
        .boxed()
    }
}

fn key_to_location(key: &str) -> Path {
    Path::from_iter(key.split('/'))
}

fn location_to_key(location: &Path) -> String {
    location
        .parts()
        .map(|part| percent_decode_str(part.as_ref()).decode_utf8_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Backend over any `object_store` implementation; used for in-memory
/// buckets.
#[derive(Clone)]
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectStoreBackend{{{}}}", self.store)
    }
}

impl ObjectStoreBackend {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ObjectBackend for ObjectStoreBackend {
    async fn head(&self, key: &str) -> StoreResult<ObjectRecord> {
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self.store.get_opts(&key_to_location(key), options).await?;
        Ok(ObjectRecord::from_meta(result.meta, &result.attributes))
    }

    async fn get(&self, key: &str) -> StoreResult<BoxStream<'static, StoreResult<Bytes>>> {
        let result = self.store.get(&key_to_location(key)).await?;
        Ok(result.into_stream())
    }

    async fn put(&self, key: &str, data: Bytes, attributes: Attributes) -> StoreResult<()> {
        let options = PutOptions {
            attributes,
            ..Default::default()
        };
        _ = self
            .store
            .put_opts(&key_to_location(key), PutPayload::from(data), options)
            .await?;
        Ok(())
    }

    /// Switches to a multipart upload once the buffered data grows large.
    async fn put_reader(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        attributes: Attributes,
    ) -> std::io::Result<u64> {
        let mut writer =
            BufWriter::new(self.store.clone(), key_to_location(key)).with_attributes(attributes);
        let copied = match tokio::io::copy(reader, &mut writer).await {
            Ok(n) => n,
            Err(e) => {
                if let Err(abort) = writer.abort().await {
                    let error = abort.to_string();
                    diagnostics::log_warn!("Failed to abort upload of {key}: {error}", key: key, error: error);
                }
                return Err(e);
            }
        };
        writer.shutdown().await?;
        Ok(copied)
    }

    fn list(&self, prefix: Option<&str>) -> BoxStream<'static, StoreResult<ObjectRecord>> {
        let prefix = prefix.map(key_to_location);
        self.store
            .list(prefix.as_ref())
            .map(|item| item.map(ObjectRecord::from_listing))
            .boxed()
    }

    async fn list_children(&self, prefix: Option<&str>) -> StoreResult<Children> {
        let prefix = prefix.map(key_to_location);
        let listing = self.store.list_with_delimiter(prefix.as_ref()).await?;
        Ok(Children {
            objects: listing
                .objects
                .into_iter()
                .map(ObjectRecord::from_listing)
                .collect(),
            prefixes: listing
                .common_prefixes
                .iter()
                .map(location_to_key)
                .collect(),
        })
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.store.delete(&key_to_location(key)).await
    }

    async fn copy(&self, from: &str, to: &str) -> StoreResult<()> {
        self.store
            .copy(&key_to_location(from), &key_to_location(to))
            .await
    }

    fn delete_stream<'a>(
        &'a self,
        keys: BoxStream<'a, StoreResult<String>>,
    ) -> BoxStream<'a, StoreResult<String>> {
        let locations = keys.map_ok(|key| key_to_location(&key)).boxed();
        self.store
            .delete_stream(locations)
            .map_ok(|location| location_to_key(&location))
            .boxed()
    }
}

/// The bucket every filesystem operation talks to.
#[derive(Clone, Debug)]
pub struct Bucket {
    backend: Arc<dyn ObjectBackend>,
}

impl Bucket {
    pub fn new(backend: Arc<dyn ObjectBackend>) -> Self {
        Self { backend }
    }

    pub fn from_object_store(store: Arc<dyn ObjectStore>) -> Self {
        Self::new(Arc::new(ObjectStoreBackend::new(store)))
    }

    pub async fn stat(&self, key: &str) -> StoreResult<ObjectRecord> {
        self.backend.head(key).await
    }

    pub async fn get(&self, key: &str) -> StoreResult<BoxStream<'static, StoreResult<Bytes>>> {
        self.backend.get(key).await
    }

    /// Reads a whole object body.
    pub async fn read_all(&self, key: &str) -> StoreResult<Bytes> {
        let chunks: Vec<Bytes> = self.backend.get(key).await?.try_collect().await?;
        Ok(chunks.concat().into())
    }

    pub async fn put(&self, key: &str, data: Bytes, attributes: Attributes) -> StoreResult<()> {
        self.backend.put(key, data, attributes).await
    }

    /// Writes an object of unknown size from a reader.
    pub async fn put_stream<R>(
        &self,
        key: &str,
        reader: &mut R,
        attributes: Attributes,
    ) -> std::io::Result<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.backend.put_reader(key, reader, attributes).await
    }

    pub fn list(&self, prefix: Option<&str>) -> BoxStream<'static, StoreResult<ObjectRecord>> {
        self.backend.list(prefix)
    }

    pub async fn list_children(&self, prefix: Option<&str>) -> StoreResult<Children> {
        self.backend.list_children(prefix).await
    }

    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        self.backend.delete(key).await
    }

    pub fn delete_stream<'a>(
        &'a self,
        keys: BoxStream<'a, StoreResult<String>>,
    ) -> BoxStream<'a, StoreResult<String>> {
        self.backend.delete_stream(keys)
    }

    pub async fn copy(&self, from: &str, to: &str) -> StoreResult<()> {
        self.backend.copy(from, to).await
    }
}
