// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory buckets for tests and local experiments.

use object_store::memory::InMemory;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::fs::FS;

/// Filesystem over a fresh, empty in-memory bucket with default settings.
pub async fn new_fs() -> FS {
    new_fs_with(&Config::memory()).await.expect("infallible")
}

/// Like `new_fs`, honoring the umask and marker name of `config`.
pub async fn new_fs_with(config: &Config) -> Result<FS> {
    FS::with_store(config, Arc::new(InMemory::new()))
}
