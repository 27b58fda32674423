// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use tokio_util::io::StreamReader;

use crate::EntryType;
use crate::error::{Error, Result};
use crate::fs::FS;
use crate::info::{DirEntry, FileInfo};
use crate::metadata::{guess_content_type, object_attributes};
use crate::resolve::Resolved;

type Body = StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>;

/// An open file or directory.
///
/// A file handle owns one streaming GET of the object body. A directory
/// handle owns no stream; it can only be listed.
pub struct File {
    fs: FS,
    path: String,
    key: String,
    info: FileInfo,
    body: Option<Body>,
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("key", &self.key)
            .field("info", &self.info)
            .field("streaming", &self.body.is_some())
            .finish()
    }
}

impl File {
    pub(crate) async fn open(fs: FS, path: &str, resolved: Resolved) -> Result<Self> {
        let body = match resolved.entry_type {
            EntryType::File => Some(Self::fetch(&fs, path, &resolved.key).await?),
            EntryType::Directory => None,
        };
        Ok(Self {
            fs,
            path: path.to_string(),
            key: resolved.key,
            info: resolved.info,
            body,
        })
    }

    async fn fetch(fs: &FS, path: &str, key: &str) -> Result<Body> {
        let stream = fs
            .bucket()
            .get(key)
            .await
            .map_err(|e| Error::from_store(path, e))?;
        Ok(StreamReader::new(stream.map_err(io::Error::other).boxed()))
    }

    /// The path this handle was opened with.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.info.name()
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.info.is_dir()
    }

    /// Snapshot taken when the handle was opened or last written.
    #[must_use]
    pub fn stat(&self) -> &FileInfo {
        &self.info
    }

    fn body(&mut self) -> Result<&mut Body> {
        match self.body.as_mut() {
            Some(body) => Ok(body),
            None => Err(Error::is_a_directory(&self.path)),
        }
    }

    /// Lists the directory. `n <= 0` returns every entry; otherwise at most
    /// `n`, taken in name order.
    pub async fn read_dir(&self, n: isize) -> Result<Vec<DirEntry>> {
        if !self.is_dir() {
            return Err(Error::not_a_directory(&self.path));
        }
        self.fs.list_dir(&self.path, &self.key, n).await
    }

    /// Reads the rest of the body.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let path = self.path.clone();
        let body = self.body()?;
        let mut data = Vec::new();
        _ = body
            .read_to_end(&mut data)
            .await
            .map_err(|e| Error::io(&path, e))?;
        Ok(data)
    }

    /// Copies the rest of the body into `writer`.
    pub async fn write_to<W>(&mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let path = self.path.clone();
        let body = self.body()?;
        tokio::io::copy(body, writer)
            .await
            .map_err(|e| Error::io(&path, e))
    }

    /// Replaces the whole object with `data`, keeping its mode and content
    /// type. Reading afterwards starts over with the new content.
    pub async fn write<D>(&mut self, data: D) -> Result<usize>
    where
        D: Into<Bytes>,
    {
        if self.is_dir() {
            return Err(Error::is_a_directory(&self.path));
        }
        let data = data.into();
        let size = data.len();

        let mode = self.fs.preserved_mode(self.info.mode_field());
        let content_type = self
            .info
            .content_type()
            .unwrap_or_else(|| guess_content_type(&self.key))
            .to_string();
        self.fs
            .bucket()
            .put(&self.key, data, object_attributes(mode, Some(&content_type)))
            .await
            .map_err(|e| Error::from_store(&self.path, e))?;

        self.info = self.fs.resolve(&self.path, false).await?.info;
        self.body = Some(Self::fetch(&self.fs, &self.path, &self.key).await?);
        Ok(size)
    }

    pub async fn write_string(&mut self, s: &str) -> Result<usize> {
        self.write(Bytes::copy_from_slice(s.as_bytes())).await
    }

    /// Releases the body stream.
    pub fn close(self) {
        let path = self.path.as_str();
        diagnostics::log_debug!("close {path}", path: path);
    }
}

impl AsyncRead for File {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match this.body.as_mut() {
            Some(body) => Pin::new(body).poll_read(cx, buf),
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", this.path),
            ))),
        }
    }
}
