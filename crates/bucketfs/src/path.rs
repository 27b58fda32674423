// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Mapping between logical paths and object keys.
//!
//! A bucket has no directories, so a directory is represented by a marker
//! object stored at `<dir-key>/<marker>`; the root directory is the bare
//! marker. The marker name is configurable (default `"."`), which is why the
//! normalizer is a value carrying it rather than a set of free functions.

use crate::error::{Error, Result};

pub const DEFAULT_DIR_FILE_NAME: &str = ".";

const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNormalizer {
    marker: String,
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DIR_FILE_NAME)
    }
}

impl PathNormalizer {
    pub fn new<S: Into<String>>(marker: S) -> Self {
        let marker = marker.into();
        let marker = if marker.is_empty() {
            DEFAULT_DIR_FILE_NAME.to_string()
        } else {
            marker
        };
        Self { marker }
    }

    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Canonicalizes a logical path into an object key.
    ///
    /// Segments named like the marker are treated as `.`, surrounding and
    /// repeated slashes are dropped, and `name/..` pairs are resolved
    /// lexically. An empty result names the root, which is the marker itself.
    /// Leading `..` segments that cannot be resolved are kept; `key` rejects
    /// them.
    #[must_use]
    pub fn normalize(&self, path: &str) -> String {
        let mut segments: Vec<&str> = Vec::new();

        for segment in path.split(SEPARATOR) {
            if segment.is_empty() || segment == "." || segment == self.marker {
                continue;
            }
            if segment == ".." {
                match segments.last() {
                    Some(last) if *last != ".." => {
                        _ = segments.pop();
                    }
                    _ => segments.push(segment),
                }
                continue;
            }
            segments.push(segment);
        }

        if segments.is_empty() {
            self.marker.clone()
        } else {
            segments.join("/")
        }
    }

    /// Normalizes `path` and rejects keys that would escape the root.
    pub fn key(&self, path: &str) -> Result<String> {
        let key = self.normalize(path);
        if key.split(SEPARATOR).any(|segment| segment == "..") {
            return Err(Error::invalid_path(path));
        }
        Ok(key)
    }

    #[must_use]
    pub fn is_root(&self, key: &str) -> bool {
        key == self.marker
    }

    /// True for the root marker and for any `<prefix>/<marker>` key.
    #[must_use]
    pub fn is_marker(&self, key: &str) -> bool {
        self.is_root(key) || basename(key) == self.marker
    }

    /// Key of the marker object that represents directory `key`.
    #[must_use]
    pub fn marker_key(&self, key: &str) -> String {
        if self.is_root(key) {
            self.marker.clone()
        } else {
            format!("{key}/{}", self.marker)
        }
    }

    /// Key of the directory containing `key`; the root for top-level keys
    /// and for the root itself.
    #[must_use]
    pub fn parent(&self, key: &str) -> String {
        match key.rsplit_once(SEPARATOR) {
            Some((parent, _)) if !parent.is_empty() => parent.to_string(),
            _ => self.marker.clone(),
        }
    }

    /// Listing prefix for the children of directory `key`. `None` is the
    /// whole bucket.
    #[must_use]
    pub fn list_prefix<'a>(&self, key: &'a str) -> Option<&'a str> {
        if self.is_root(key) { None } else { Some(key) }
    }

    /// Joins a child name onto a directory key.
    #[must_use]
    pub fn join(&self, dir: &str, name: &str) -> String {
        if self.is_root(dir) {
            name.to_string()
        } else {
            format!("{dir}/{name}")
        }
    }

    /// Successive ancestors of `key`, root first, ending with `key` itself.
    #[must_use]
    pub fn ancestors(&self, key: &str) -> Vec<String> {
        let mut keys = vec![self.marker.clone()];
        if self.is_root(key) {
            return keys;
        }
        let mut current = String::new();
        for segment in key.split(SEPARATOR) {
            if !current.is_empty() {
                current.push(SEPARATOR);
            }
            current.push_str(segment);
            keys.push(current.clone());
        }
        keys
    }
}

/// Extracts the final segment of a key
#[must_use]
pub fn basename(key: &str) -> &str {
    let trimmed = key.trim_end_matches(SEPARATOR);
    match trimmed.rsplit_once(SEPARATOR) {
        Some((_, name)) => name,
        None => trimmed,
    }
}
