// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::{Context as _, Result, anyhow};
use bucketfs::{Config, FS, FileInfo, FileMode};

/// Where the bucket configuration comes from.
#[derive(Debug, Clone, Default)]
pub struct ShipContext {
    /// YAML configuration file; the environment is used when absent.
    pub config_path: Option<PathBuf>,
}

impl ShipContext {
    #[must_use]
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    pub fn load_config(&self) -> Result<Config> {
        match &self.config_path {
            Some(path) => Config::from_yaml_file(path)
                .with_context(|| format!("loading {}", path.display())),
            None => Config::from_env().context("reading configuration from the environment"),
        }
    }

    pub fn open_fs(&self) -> Result<FS> {
        let config = self.load_config()?;
        let bucket = config.bucket_name.as_str();
        diagnostics::log_info!("Opening bucket {bucket}", bucket: bucket);
        Ok(FS::new(&config)?)
    }
}

/// Parses an octal permission string such as `644` or `0o755`.
pub fn parse_mode(value: &str) -> Result<FileMode> {
    let digits = value.trim_start_matches("0o");
    let bits = u32::from_str_radix(digits, 8)
        .map_err(|_| anyhow!("invalid mode '{value}': expected octal digits"))?;
    if bits > FileMode::PERM {
        return Err(anyhow!("invalid mode '{value}': only permission bits are allowed"));
    }
    Ok(FileMode::new(bits))
}

/// Helper function to format file sizes
#[must_use]
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    match size {
        s if s >= GB => format!("{:.1}GB", s as f64 / GB as f64),
        s if s >= MB => format!("{:.1}MB", s as f64 / MB as f64),
        s if s >= KB => format!("{:.1}KB", s as f64 / KB as f64),
        s => format!("{s}B"),
    }
}

/// One `ls -l` line.
#[must_use]
pub fn format_long(info: &FileInfo) -> String {
    let suffix = if info.is_dir() { "/" } else { "" };
    format!(
        "{} {:>8} {} {}{}",
        info.mode(),
        format_file_size(info.size()),
        info.modified().format("%Y-%m-%d %H:%M:%S"),
        info.name(),
        suffix
    )
}
