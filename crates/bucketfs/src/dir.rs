// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Directory operations built out of single-object requests.

use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result, store_not_found};
use crate::fs::FS;
use crate::info::DirEntry;
use crate::metadata::{FileMode, object_attributes};
use crate::store::StoreResult;

/// Listed keys buffered between the remove_all lister and deleter.
pub const REMOVE_ALL_CHANNEL_DEPTH: usize = 64;

impl FS {
    /// Creates (or overwrites) the marker for `path`. The parent is not
    /// required to exist.
    pub async fn mkdir(&self, path: &str, mode: FileMode) -> Result<()> {
        diagnostics::log_debug!("mkdir {path}", path: path);
        let key = self.names().key(path)?;
        self.put_marker(path, &key, mode).await
    }

    /// Creates the root marker and then every prefix of `path`, shortest
    /// first. Each step is an idempotent `mkdir`, so rerunning after a
    /// failure picks up where it stopped.
    pub async fn mkdir_all(&self, path: &str, mode: FileMode) -> Result<()> {
        diagnostics::log_debug!("mkdir_all {path}", path: path);
        let key = self.names().key(path)?;
        for ancestor in self.names().ancestors(&key) {
            self.put_marker(path, &ancestor, mode).await?;
        }
        Ok(())
    }

    async fn put_marker(&self, path: &str, key: &str, mode: FileMode) -> Result<()> {
        let marker = self.names().marker_key(key);
        let mode = self.apply_umask(mode.with_dir());
        self.bucket()
            .put(&marker, Bytes::new(), object_attributes(mode, None))
            .await
            .map_err(|e| Error::from_store(path, e))
    }

    /// Every entry of a directory, sorted by name.
    pub async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let resolved = self.resolve(path, false).await?;
        if !resolved.entry_type.is_dir() {
            return Err(Error::not_a_directory(path));
        }
        self.list_dir(path, &resolved.key, 0).await
    }

    pub(crate) async fn list_dir(&self, path: &str, key: &str, limit: isize) -> Result<Vec<DirEntry>> {
        diagnostics::log_debug!("read_dir {path}", path: path);
        let children = self
            .bucket()
            .list_children(self.names().list_prefix(key))
            .await
            .map_err(|e| Error::from_store(path, e))?;

        let mut keys: Vec<String> = children
            .objects
            .into_iter()
            .map(|object| object.key)
            .filter(|child| !self.names().is_marker(child))
            .collect();
        keys.extend(children.prefixes);
        // An object and a marked prefix can share a name; resolve it once.
        keys.sort();
        keys.dedup();

        // Listings carry no user metadata, so each child needs its own stat.
        let mut entries = Vec::with_capacity(keys.len());
        for child in keys {
            match self.resolve(&child, true).await {
                Ok(resolved) => entries.push(DirEntry::new(resolved.info)),
                Err(e) if e.is_not_found() => {
                    diagnostics::log_warn!("Skipping {child} in {path}: vanished or has no marker", child: child, path: path);
                }
                Err(e) => return Err(e),
            }
        }

        entries.sort_by(|a, b| a.name().cmp(b.name()));
        match usize::try_from(limit) {
            Ok(limit) if limit > 0 => entries.truncate(limit),
            _ => {}
        }
        Ok(entries)
    }

    /// Removes a file, or an empty directory.
    pub async fn remove(&self, path: &str) -> Result<()> {
        diagnostics::log_debug!("remove {path}", path: path);
        let key = self.names().key(path)?;

        if !self.names().is_root(&key) {
            match self.bucket().stat(&key).await {
                Ok(_) => {
                    return self
                        .bucket()
                        .delete(&key)
                        .await
                        .map_err(|e| Error::from_store(path, e));
                }
                Err(e) if store_not_found(&e) => {}
                Err(e) => return Err(Error::from_store(path, e)),
            }
        }

        let marker = self.names().marker_key(&key);
        _ = self
            .bucket()
            .stat(&marker)
            .await
            .map_err(|e| Error::from_store(path, e))?;

        let children = self
            .bucket()
            .list_children(self.names().list_prefix(&key))
            .await
            .map_err(|e| Error::from_store(path, e))?;
        let others = children.prefixes.len()
            + children
                .objects
                .iter()
                .filter(|object| object.key != marker)
                .count();
        if others > 0 {
            return Err(Error::not_empty(path));
        }
        if children.is_empty() {
            diagnostics::log_warn!("Marker for {path} missing from its own listing", path: path);
        }

        self.bucket()
            .delete(&marker)
            .await
            .map_err(|e| Error::from_store(path, e))
    }

    /// Removes `path` and everything below it. A missing path is not an
    /// error.
    ///
    /// Listing runs in a spawned task feeding a bounded channel while this
    /// task drains it into the store's bulk delete. Whichever way this
    /// function returns, the lister is cancelled.
    pub async fn remove_all(&self, path: &str) -> Result<()> {
        diagnostics::log_debug!("remove_all {path}", path: path);
        let key = self.names().key(path)?;
        let prefix = self.names().list_prefix(&key).map(str::to_string);

        let (mut tx, rx) = mpsc::channel::<StoreResult<String>>(REMOVE_ALL_CHANNEL_DEPTH);
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();

        let bucket = self.bucket().clone();
        let names = self.names().clone();
        let producer_key = key.clone();
        _ = tokio::spawn(async move {
            let key = producer_key.as_str();
            let feed = async {
                if !names.is_root(key) {
                    match bucket.stat(key).await {
                        Ok(record) => {
                            if tx.send(Ok(record.key)).await.is_err() {
                                return;
                            }
                        }
                        Err(e) if store_not_found(&e) => {}
                        Err(e) => {
                            let error = e.to_string();
                            diagnostics::log_warn!("Cannot stat {key} for removal: {error}", key: key, error: error);
                        }
                    }
                }

                let mut listing = bucket.list(prefix.as_deref());
                while let Some(item) = listing.next().await {
                    match item {
                        Ok(record) => {
                            if tx.send(Ok(record.key)).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            let error = e.to_string();
                            diagnostics::log_warn!("Skipping entry while listing {key}: {error}", key: key, error: error);
                        }
                    }
                }
            };

            tokio::select! {
                () = cancel.cancelled() => {}
                () = feed => {}
            }
        });

        let mut deleted = self.bucket().delete_stream(rx.boxed());
        let mut count = 0usize;
        while let Some(result) = deleted.next().await {
            match result {
                Ok(_) => count += 1,
                Err(e) if store_not_found(&e) => {}
                Err(e) => return Err(Error::from_store(path, e)),
            }
        }
        diagnostics::log_debug!("remove_all {path} deleted {count} objects", path: path, count: count);
        Ok(())
    }
}
