// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! A POSIX-like filesystem view over a flat object store bucket.
//!
//! Directories are represented by zero-byte marker objects; permission
//! modes travel as object metadata.

mod config;
mod dir;
mod entry_type;
mod error;
mod file;
mod fs;
mod info;
mod metadata;
mod path;
mod resolve;
mod s3;
mod store;
mod walk;

pub mod memory;

pub use config::{Config, StorageType};
pub use dir::REMOVE_ALL_CHANNEL_DEPTH;
pub use entry_type::EntryType;
pub use error::{Error, Result};
pub use file::File;
pub use fs::FS;
pub use info::{DirEntry, FileInfo};
pub use metadata::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, FileMode, ModeField, umask};
pub use path::{DEFAULT_DIR_FILE_NAME, PathNormalizer, basename};
pub use s3::S3Backend;
pub use store::{Bucket, Children, ObjectBackend, ObjectRecord, ObjectStoreBackend, StoreResult};
pub use walk::{CollectingVisitor, Visitor, Walk};

#[cfg(test)]
mod tests;
