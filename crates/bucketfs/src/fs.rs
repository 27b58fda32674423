// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;
use object_store::ObjectStore;
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::EntryType;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::file::File;
use crate::info::FileInfo;
use crate::metadata::{
    DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, FileMode, ModeField, guess_content_type,
    object_attributes, umask,
};
use crate::path::PathNormalizer;
use crate::store::{Bucket, ObjectBackend, ObjectStoreBackend};

/// Filesystem view over one bucket.
///
/// Cloning is cheap; clones share the same store client.
#[derive(Clone)]
pub struct FS {
    inner: Arc<Inner>,
}

struct Inner {
    bucket: Bucket,
    names: PathNormalizer,
    umask: u32,
}

impl std::fmt::Debug for FS {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FS")
            .field("bucket", &self.inner.bucket)
            .field("marker", &self.inner.names.marker())
            .field("umask", &format!("{:o}", self.inner.umask))
            .finish()
    }
}

impl FS {
    /// Connects to the bucket described by `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let backend = config.build_backend()?;
        Self::with_backend(config, backend)
    }

    /// Uses an existing `object_store` client; only the umask and marker
    /// name are taken from `config`.
    pub fn with_store(config: &Config, store: Arc<dyn ObjectStore>) -> Result<Self> {
        Self::with_backend(config, Arc::new(ObjectStoreBackend::new(store)))
    }

    pub fn with_backend(config: &Config, backend: Arc<dyn ObjectBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                bucket: Bucket::new(backend),
                names: PathNormalizer::new(config.dir_file_name()),
                umask: config.umask,
            }),
        })
    }

    pub(crate) fn bucket(&self) -> &Bucket {
        &self.inner.bucket
    }

    #[must_use]
    pub fn names(&self) -> &PathNormalizer {
        &self.inner.names
    }

    #[must_use]
    pub fn umask(&self) -> u32 {
        self.inner.umask
    }

    pub(crate) fn apply_umask(&self, mode: FileMode) -> FileMode {
        umask(self.inner.umask, mode)
    }

    /// Opens a file for reading, or a directory for listing.
    pub async fn open(&self, path: &str) -> Result<File> {
        diagnostics::log_debug!("open {path}", path: path);
        let resolved = self.resolve(path, true).await?;
        File::open(self.clone(), path, resolved).await
    }

    /// Describes a path without fetching its body.
    pub async fn stat(&self, path: &str) -> Result<FileInfo> {
        diagnostics::log_debug!("stat {path}", path: path);
        Ok(self.resolve(path, true).await?.info)
    }

    /// Reads a whole file.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut file = self.open(path).await?;
        let data = file.read_to_end().await?;
        file.close();
        Ok(data)
    }

    /// Creates or truncates a file with mode `0o666` less the umask.
    pub async fn create(&self, path: &str) -> Result<File> {
        diagnostics::log_debug!("create {path}", path: path);
        let key = self.file_key(path)?;
        self.ensure_parent(&key).await?;

        let mode = self.apply_umask(DEFAULT_FILE_MODE);
        let attributes = object_attributes(mode, Some(guess_content_type(&key)));
        self.bucket()
            .put(&key, Bytes::new(), attributes)
            .await
            .map_err(|e| Error::from_store(path, e))?;

        self.open(path).await
    }

    /// Writes `data` as the whole content of `path`, creating parent
    /// directories as needed.
    pub async fn write_file<D>(&self, path: &str, data: D, perm: FileMode) -> Result<()>
    where
        D: Into<Bytes>,
    {
        let data = data.into();
        let size = data.len();
        diagnostics::log_debug!("write_file {path} ({size} bytes)", path: path, size: size);

        let key = self.file_key(path)?;
        self.ensure_parent(&key).await?;

        let attributes = object_attributes(
            self.apply_umask(perm),
            Some(guess_content_type(&key)),
        );
        self.bucket()
            .put(&key, data, attributes)
            .await
            .map_err(|e| Error::from_store(path, e))
    }

    /// Like `write_file`, for content of unknown length. Returns the number
    /// of bytes uploaded.
    pub async fn write_from<R>(&self, path: &str, reader: &mut R, perm: FileMode) -> Result<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        diagnostics::log_debug!("write_from {path}", path: path);
        let key = self.file_key(path)?;
        self.ensure_parent(&key).await?;

        let attributes = object_attributes(
            self.apply_umask(perm),
            Some(guess_content_type(&key)),
        );
        self.bucket()
            .put_stream(&key, reader, attributes)
            .await
            .map_err(|e| Error::io(path, e))
    }

    /// Replaces the stored mode of a file or directory.
    pub async fn chmod(&self, path: &str, mode: FileMode) -> Result<()> {
        let bits = mode.encode();
        diagnostics::log_debug!("chmod {path} {bits}", path: path, bits: bits);
        let resolved = self.resolve(path, false).await?;

        match resolved.entry_type {
            EntryType::Directory => {
                let mode = self.apply_umask(FileMode::new(mode.perm()).with_dir());
                self.bucket()
                    .put(&resolved.record.key, Bytes::new(), object_attributes(mode, None))
                    .await
                    .map_err(|e| Error::from_store(path, e))
            }
            EntryType::File => {
                let data = self
                    .bucket()
                    .read_all(&resolved.key)
                    .await
                    .map_err(|e| Error::from_store(path, e))?;
                let mode = self.apply_umask(FileMode::new(mode.perm()));
                let content_type = resolved
                    .record
                    .content_type
                    .clone()
                    .unwrap_or_else(|| guess_content_type(&resolved.key).to_string());
                self.bucket()
                    .put(&resolved.key, data, object_attributes(mode, Some(&content_type)))
                    .await
                    .map_err(|e| Error::from_store(path, e))
            }
        }
    }

    /// Moves a file by copying it and deleting the source. Not atomic;
    /// directories are refused.
    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        diagnostics::log_debug!("rename {from} -> {to}", from: from, to: to);
        let source = self.resolve(from, false).await?;
        if source.entry_type.is_dir() {
            return Err(Error::is_a_directory(from));
        }

        let target = self.file_key(to)?;
        if target == source.key {
            return Ok(());
        }
        match self.resolve(to, false).await {
            Ok(existing) if existing.entry_type.is_dir() => {
                return Err(Error::is_a_directory(to));
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        self.ensure_parent(&target).await?;
        self.bucket()
            .copy(&source.key, &target)
            .await
            .map_err(|e| Error::from_store(from, e))?;
        self.bucket()
            .delete(&source.key)
            .await
            .map_err(|e| Error::from_store(from, e))
    }

    /// Key for a path that is about to be written as a file.
    fn file_key(&self, path: &str) -> Result<String> {
        let key = self.names().key(path)?;
        if self.names().is_root(&key) {
            return Err(Error::is_a_directory(path));
        }
        Ok(key)
    }

    async fn ensure_parent(&self, key: &str) -> Result<()> {
        let parent = self.names().parent(key);
        self.mkdir_all(&parent, DEFAULT_DIR_MODE).await
    }

    /// Stored mode for rewriting an existing file, falling back to the
    /// default file mode when the object never had one.
    pub(crate) fn preserved_mode(&self, field: &ModeField) -> FileMode {
        match field {
            ModeField::Parsed(mode) => *mode,
            ModeField::Missing | ModeField::Unparseable(_) => self.apply_umask(DEFAULT_FILE_MODE),
        }
    }
}
