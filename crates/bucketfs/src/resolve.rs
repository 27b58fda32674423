// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Classifies a logical path as a file, a directory, or nothing.
//!
//! The store has no notion of directories, so every call queries it: first
//! the key itself, then the directory marker below it. Nothing is cached.

use futures::StreamExt;

use crate::EntryType;
use crate::error::{Error, Result, store_not_found};
use crate::fs::FS;
use crate::info::FileInfo;
use crate::path::basename;
use crate::store::ObjectRecord;

/// Outcome of probing the store for one path.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    /// Normalized key of the path (not the marker key).
    pub key: String,
    pub entry_type: EntryType,
    /// The object that was found: the file itself or the directory marker.
    pub record: ObjectRecord,
    pub info: FileInfo,
}

impl FS {
    /// Resolves `path`. With `totals`, a directory's size and modification
    /// time cover everything below it; this costs a recursive listing.
    pub(crate) async fn resolve(&self, path: &str, totals: bool) -> Result<Resolved> {
        let key = self.names().key(path)?;
        let root = self.names().is_root(&key);

        match self.bucket().stat(&key).await {
            Ok(record) if root => return self.resolve_dir(key, record, totals).await,
            Ok(record) => {
                let info = FileInfo::new(basename(&key).to_string(), EntryType::File, &record);
                return Ok(Resolved {
                    key,
                    entry_type: EntryType::File,
                    record,
                    info,
                });
            }
            Err(e) if store_not_found(&e) && !root => {}
            Err(e) => return Err(Error::from_store(path, e)),
        }

        let marker = self.names().marker_key(&key);
        let record = self
            .bucket()
            .stat(&marker)
            .await
            .map_err(|e| Error::from_store(path, e))?;
        self.resolve_dir(key, record, totals).await
    }

    async fn resolve_dir(&self, key: String, marker: ObjectRecord, totals: bool) -> Result<Resolved> {
        let mut info = FileInfo::new(basename(&key).to_string(), EntryType::Directory, &marker);

        if totals {
            let dir = key.as_str();
            let mut listing = self.bucket().list(self.names().list_prefix(&key));
            while let Some(item) = listing.next().await {
                match item {
                    Ok(record) if record.key == marker.key => {}
                    Ok(record) => info.accumulate(&record),
                    Err(e) => {
                        let error = e.to_string();
                        diagnostics::log_warn!("Skipping entry while sizing {dir}: {error}", dir: dir, error: error);
                    }
                }
            }
        }

        Ok(Resolved {
            key,
            entry_type: EntryType::Directory,
            record: marker,
            info,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::memory::new_fs;
    use crate::metadata::FileMode;
    use crate::EntryType;

    #[tokio::test]
    async fn test_resolve_file_and_directory() {
        let fs = new_fs().await;
        fs.write_file("a/b.txt", &b"12345"[..], FileMode::new(0o644))
            .await
            .unwrap();

        let file = fs.resolve("a/b.txt", true).await.unwrap();
        assert_eq!(file.entry_type, EntryType::File);
        assert_eq!(file.key, "a/b.txt");
        assert_eq!(file.info.size(), 5);

        let dir = fs.resolve("/a/", true).await.unwrap();
        assert_eq!(dir.entry_type, EntryType::Directory);
        assert_eq!(dir.key, "a");
        assert_eq!(dir.record.key, "a/.");
        assert_eq!(dir.info.size(), 5);
        assert_eq!(dir.info.name(), "a");
    }

    #[tokio::test]
    async fn test_resolve_without_totals_uses_marker_only() {
        let fs = new_fs().await;
        fs.write_file("d/f", &b"xyz"[..], FileMode::new(0o600))
            .await
            .unwrap();
        let dir = fs.resolve("d", false).await.unwrap();
        assert_eq!(dir.info.size(), 0);
    }

    #[tokio::test]
    async fn test_resolve_root() {
        let fs = new_fs().await;
        assert!(fs.resolve("", false).await.unwrap_err().is_not_found());

        fs.mkdir("/", FileMode::new(0o755)).await.unwrap();
        fs.write_file("top", &b"1"[..], FileMode::new(0o644))
            .await
            .unwrap();
        fs.write_file("x/y/z", &b"22"[..], FileMode::new(0o644))
            .await
            .unwrap();

        let root = fs.resolve(".", true).await.unwrap();
        assert_eq!(root.entry_type, EntryType::Directory);
        assert_eq!(root.info.name(), ".");
        assert_eq!(root.info.size(), 3);
    }

    #[tokio::test]
    async fn test_resolve_missing() {
        let fs = new_fs().await;
        let err = fs.resolve("missing/path", true).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.path(), Some("missing/path"));
    }
}
