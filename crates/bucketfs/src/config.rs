// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Bucket configuration
//!
//! Fields:
//! - storage_type: "s3" (default) or "memory"
//! - access_key_id / secret_access_key: credential pair
//! - endpoint: S3-compatible endpoint host or URL (empty for AWS)
//! - region: region identifier
//! - use_ssl: TLS on/off; plain HTTP is allowed when off
//! - bucket_name: bucket holding the filesystem
//! - umask: subtracted from every requested mode
//! - dir_file_name: directory marker token (default "."; S3 buckets
//!   need another token, such as ".dir")

use crate::error::{Error, Result};
use crate::path::DEFAULT_DIR_FILE_NAME;
use crate::s3::S3Backend;
use crate::store::{ObjectBackend, ObjectStoreBackend};
use object_store::memory::InMemory;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    S3,
    Memory,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::S3 => write!(f, "s3"),
            StorageType::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(StorageType::S3),
            "memory" => Ok(StorageType::Memory),
            other => Err(Error::config(format!(
                "Invalid storage_type: {other}. Must be 's3' or 'memory'"
            ))),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage_type: StorageType,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub use_ssl: bool,

    #[serde(default)]
    pub bucket_name: String,

    #[serde(default)]
    pub umask: u32,

    #[serde(default = "default_dir_file_name")]
    pub dir_file_name: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_dir_file_name() -> String {
    DEFAULT_DIR_FILE_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_type: StorageType::default(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            endpoint: String::new(),
            region: default_region(),
            use_ssl: false,
            bucket_name: String::new(),
            umask: 0,
            dir_file_name: default_dir_file_name(),
        }
    }
}

// Keeps the secret out of logs and panics.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("storage_type", &self.storage_type)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("use_ssl", &self.use_ssl)
            .field("bucket_name", &self.bucket_name)
            .field("umask", &format!("{:o}", self.umask))
            .field("dir_file_name", &self.dir_file_name)
            .finish()
    }
}

impl Config {
    /// In-memory bucket, mostly for tests.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            storage_type: StorageType::Memory,
            bucket_name: "memory".to_string(),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.to_string_lossy(), e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Reads the configuration from `ACCESS_KEY_ID`, `SECRET_ACCESS_KEY`,
    /// `ENDPOINT`, `REGION`, `USE_SSL`, `BUCKET_NAME`, `UMASK` (octal),
    /// `DIR_FILE_NAME` and `STORAGE_TYPE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(value) = lookup("STORAGE_TYPE") {
            config.storage_type = value.parse()?;
        }
        if let Some(value) = lookup("ACCESS_KEY_ID") {
            config.access_key_id = value;
        }
        if let Some(value) = lookup("SECRET_ACCESS_KEY") {
            config.secret_access_key = value;
        }
        if let Some(value) = lookup("ENDPOINT") {
            config.endpoint = value;
        }
        if let Some(value) = lookup("REGION").filter(|v| !v.is_empty()) {
            config.region = value;
        }
        if let Some(value) = lookup("USE_SSL") {
            config.use_ssl = matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(value) = lookup("BUCKET_NAME") {
            config.bucket_name = value;
        }
        if let Some(value) = lookup("UMASK").filter(|v| !v.is_empty()) {
            config.umask = u32::from_str_radix(value.trim_start_matches("0o"), 8)
                .map_err(|e| Error::config(format!("Invalid UMASK '{value}': {e}")))?;
        }
        if let Some(value) = lookup("DIR_FILE_NAME").filter(|v| !v.is_empty()) {
            config.dir_file_name = value;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_type == StorageType::S3 && self.bucket_name.is_empty() {
            return Err(Error::config("bucket_name field cannot be empty"));
        }
        if self.umask > 0o777 {
            return Err(Error::config(format!(
                "umask {:o} exceeds permission bits",
                self.umask
            )));
        }
        if self.dir_file_name.contains('/') || self.dir_file_name == ".." {
            return Err(Error::config(format!(
                "Invalid dir_file_name: {}",
                self.dir_file_name
            )));
        }
        // HTTP clients fold a "." path segment away, so it never reaches S3.
        if self.storage_type == StorageType::S3 && self.dir_file_name() == "." {
            return Err(Error::config(
                "dir_file_name '.' cannot be addressed over S3; set a marker such as '.dir'",
            ));
        }
        Ok(())
    }

    /// Marker token, falling back to the default when unset.
    #[must_use]
    pub fn dir_file_name(&self) -> &str {
        if self.dir_file_name.is_empty() {
            DEFAULT_DIR_FILE_NAME
        } else {
            &self.dir_file_name
        }
    }

    /// Endpoint as a URL; bare hosts get a scheme matching `use_ssl`.
    #[must_use]
    pub fn endpoint_url(&self) -> Option<String> {
        if self.endpoint.is_empty() {
            return None;
        }
        if self.endpoint.contains("://") {
            return Some(self.endpoint.clone());
        }
        let scheme = if self.use_ssl { "https" } else { "http" };
        Some(format!("{scheme}://{}", self.endpoint))
    }

    /// Build the storage backend from configuration
    pub fn build_backend(&self) -> Result<Arc<dyn ObjectBackend>> {
        self.validate()?;
        match self.storage_type {
            StorageType::Memory => {
                diagnostics::log_info!("Using in-memory bucket");
                Ok(Arc::new(ObjectStoreBackend::new(Arc::new(InMemory::new()))))
            }
            StorageType::S3 => Ok(Arc::new(S3Backend::connect(self)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_yaml_defaults() {
        let config = Config::from_yaml_str("bucket_name: photos\ndir_file_name: .dir\n").unwrap();
        assert_eq!(config.storage_type, StorageType::S3);
        assert_eq!(config.bucket_name, "photos");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.dir_file_name(), ".dir");
        assert_eq!(config.umask, 0);
        assert!(!config.use_ssl);

        let config = Config::from_yaml_str("storage_type: memory\n").unwrap();
        assert_eq!(config.dir_file_name(), ".");
    }

    #[test]
    fn test_yaml_full() {
        let yaml = r#"
storage_type: s3
access_key_id: minio
secret_access_key: minio123
endpoint: localhost:9000
region: eu-west-1
use_ssl: true
bucket_name: data
umask: 18
dir_file_name: .folder
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.umask, 0o022);
        assert_eq!(config.dir_file_name(), ".folder");
        assert_eq!(
            config.endpoint_url().as_deref(),
            Some("https://localhost:9000")
        );
    }

    #[test]
    fn test_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage_type: memory").unwrap();
        let config = Config::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.storage_type, StorageType::Memory);
    }

    #[test]
    fn test_validation() {
        assert!(Config::from_yaml_str("region: x\ndir_file_name: .dir\n").is_err());
        assert!(Config::from_yaml_str("bucket_name: b\ndir_file_name: .dir\numask: 1024\n").is_err());
        assert!(Config::from_yaml_str("bucket_name: b\ndir_file_name: a/b\n").is_err());
        // The default marker cannot travel over S3.
        let err = Config::from_yaml_str("bucket_name: b\n").unwrap_err();
        assert!(err.to_string().contains("dir_file_name"));
        assert!(Config::from_yaml_str("storage_type: tape\n").is_err());
        assert!(Config::memory().validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("BUCKET_NAME", "logs"),
            ("ENDPOINT", "http://127.0.0.1:9000"),
            ("UMASK", "022"),
            ("USE_SSL", "false"),
            ("DIR_FILE_NAME", ".folder"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.bucket_name, "logs");
        assert_eq!(config.umask, 0o022);
        assert_eq!(config.dir_file_name(), ".folder");
        assert_eq!(
            config.endpoint_url().as_deref(),
            Some("http://127.0.0.1:9000")
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config {
            secret_access_key: "hunter2".to_string(),
            ..Config::memory()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_build_memory_backend() {
        assert!(Config::memory().build_backend().is_ok());
    }
}
