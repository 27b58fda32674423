// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};

use crate::EntryType;
use crate::metadata::{FileMode, ModeField};
use crate::store::ObjectRecord;

/// Stat result for one logical path.
///
/// For a directory, `size` is the sum over the marker and every object
/// below it, and `modified` is the newest of their timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    name: String,
    key: String,
    entry_type: EntryType,
    size: u64,
    mode: ModeField,
    modified: DateTime<Utc>,
    content_type: Option<String>,
}

impl FileInfo {
    pub(crate) fn new(name: String, entry_type: EntryType, record: &ObjectRecord) -> Self {
        Self {
            name,
            key: record.key.clone(),
            entry_type,
            size: record.size,
            mode: record.mode_field(),
            modified: record.last_modified,
            content_type: record.content_type.clone(),
        }
    }

    /// Folds one descendant object into a directory's totals.
    pub(crate) fn accumulate(&mut self, record: &ObjectRecord) {
        self.size += record.size;
        if record.last_modified > self.modified {
            self.modified = record.last_modified;
        }
    }

    /// Last path segment; the marker name for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object key holding this entry (the marker key for directories).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.entry_type.is_dir()
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Stored mode, or zero when the metadata is absent or malformed.
    #[must_use]
    pub fn mode(&self) -> FileMode {
        self.mode.mode()
    }

    #[must_use]
    pub fn mode_field(&self) -> &ModeField {
        &self.mode
    }

    #[must_use]
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

/// One entry produced by a directory listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry {
    info: FileInfo,
}

impl DirEntry {
    pub(crate) fn new(info: FileInfo) -> Self {
        Self { info }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.info.name()
    }

    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        self.info.entry_type()
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.info.is_dir()
    }

    #[must_use]
    pub fn mode(&self) -> FileMode {
        self.info.mode()
    }

    #[must_use]
    pub fn info(&self) -> &FileInfo {
        &self.info
    }
}

impl From<FileInfo> for DirEntry {
    fn from(info: FileInfo) -> Self {
        Self::new(info)
    }
}
