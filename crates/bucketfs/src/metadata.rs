// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use object_store::{Attribute, AttributeValue, Attributes};
use std::collections::HashMap;

/// User metadata entry holding the octal mode string.
pub const MODE_KEY: &str = "mode";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Mode requested for new files before the umask is applied.
pub const DEFAULT_FILE_MODE: FileMode = FileMode(0o666);

/// Mode requested for implicitly created parent directories.
pub const DEFAULT_DIR_MODE: FileMode = FileMode(FileMode::DIR | FileMode::PERM);

/// Permission and type bits of an entry.
///
/// The directory bit is bit 31, so stored values look like `20000000755`
/// for a directory and `644` for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileMode(u32);

impl FileMode {
    pub const DIR: u32 = 1 << 31;
    pub const PERM: u32 = 0o777;

    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn perm(self) -> u32 {
        self.0 & Self::PERM
    }

    #[must_use]
    pub const fn is_dir(self) -> bool {
        self.0 & Self::DIR != 0
    }

    #[must_use]
    pub const fn with_dir(self) -> Self {
        Self(self.0 | Self::DIR)
    }

    /// Octal rendering used for the stored metadata value.
    #[must_use]
    pub fn encode(self) -> String {
        format!("{:o}", self.0)
    }
}

impl From<u32> for FileMode {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_dir() { 'd' } else { '-' };
        let mut rwx = String::with_capacity(9);
        for shift in [6u32, 3, 0] {
            let bits = (self.0 >> shift) & 0o7;
            rwx.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            rwx.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            rwx.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        write!(f, "{kind}{rwx}")
    }
}

/// Result of decoding the `mode` metadata entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeField {
    Parsed(FileMode),
    /// The object carries no `mode` entry (e.g. written by another tool).
    Missing,
    /// The entry exists but is not an octal number.
    Unparseable(String),
}

impl ModeField {
    pub fn decode(value: Option<&str>) -> Self {
        match value {
            None => ModeField::Missing,
            Some(raw) => match u32::from_str_radix(raw.trim(), 8) {
                Ok(bits) => ModeField::Parsed(FileMode(bits)),
                Err(_) => ModeField::Unparseable(raw.to_string()),
            },
        }
    }

    /// The parsed mode, or zero permissions without a directory bit.
    #[must_use]
    pub fn mode(&self) -> FileMode {
        match self {
            ModeField::Parsed(mode) => *mode,
            ModeField::Missing | ModeField::Unparseable(_) => FileMode::default(),
        }
    }
}

/// Subtracts the umask from a requested mode.
#[must_use]
pub fn umask(mask: u32, mode: FileMode) -> FileMode {
    FileMode(mode.0.saturating_sub(mask))
}

/// Builds the attribute set stored with every object this crate writes.
pub fn object_attributes(mode: FileMode, content_type: Option<&str>) -> Attributes {
    let mut attributes = Attributes::new();
    _ = attributes.insert(
        Attribute::Metadata(MODE_KEY.into()),
        AttributeValue::from(mode.encode()),
    );
    if let Some(content_type) = content_type {
        _ = attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
    }
    attributes
}

/// Extracts the user metadata map and content type from store attributes.
pub fn split_attributes(attributes: &Attributes) -> (HashMap<String, String>, Option<String>) {
    let mut metadata = HashMap::new();
    let mut content_type = None;
    for (attribute, value) in attributes {
        match attribute {
            Attribute::Metadata(key) => {
                _ = metadata.insert(key.to_ascii_lowercase(), value.as_ref().to_string());
            }
            Attribute::ContentType => content_type = Some(value.as_ref().to_string()),
            _ => {}
        }
    }
    (metadata, content_type)
}

/// Content type for a file name, by extension.
#[must_use]
pub fn guess_content_type(name: &str) -> &'static str {
    let ext = match crate::path::basename(name).rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return DEFAULT_CONTENT_TYPE,
    };
    match ext.as_str() {
        "txt" | "text" | "log" => "text/plain; charset=utf-8",
        "htm" | "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "text/xml; charset=utf-8",
        "yaml" | "yml" => "application/yaml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "wasm" => "application/wasm",
        "parquet" => "application/vnd.apache.parquet",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_encoding() {
        assert_eq!(FileMode::new(0o644).encode(), "644");
        assert_eq!(FileMode::new(0o755).with_dir().encode(), "20000000755");
    }

    #[test]
    fn test_mode_decoding() {
        assert_eq!(
            ModeField::decode(Some("20000000755")),
            ModeField::Parsed(FileMode::new(0o755).with_dir())
        );
        assert_eq!(ModeField::decode(None), ModeField::Missing);
        assert_eq!(
            ModeField::decode(Some("rw-r--r--")),
            ModeField::Unparseable("rw-r--r--".to_string())
        );
    }

    #[test]
    fn test_unparseable_mode_degrades_to_zero() {
        let field = ModeField::decode(Some("999"));
        assert_eq!(field.mode(), FileMode::default());
        assert!(!field.mode().is_dir());
        assert_eq!(ModeField::Missing.mode().bits(), 0);
    }

    #[test]
    fn test_umask_subtracts() {
        assert_eq!(umask(0o022, FileMode::new(0o666)), FileMode::new(0o644));
        assert_eq!(umask(0, FileMode::new(0o644)), FileMode::new(0o644));
        let dir = umask(0o022, DEFAULT_DIR_MODE);
        assert!(dir.is_dir());
        assert_eq!(dir.perm(), 0o755);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(FileMode::new(0o644).to_string(), "-rw-r--r--");
        assert_eq!(FileMode::new(0o750).with_dir().to_string(), "drwxr-x---");
    }

    #[test]
    fn test_attributes_roundtrip() {
        let attributes = object_attributes(FileMode::new(0o600), Some("text/plain"));
        let (metadata, content_type) = split_attributes(&attributes);
        assert_eq!(metadata.get(MODE_KEY).map(String::as_str), Some("600"));
        assert_eq!(content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("a/report.JSON"), "application/json");
        assert_eq!(guess_content_type("notes.txt"), "text/plain; charset=utf-8");
        assert_eq!(guess_content_type("testfile"), DEFAULT_CONTENT_TYPE);
        assert_eq!(guess_content_type(".hidden"), DEFAULT_CONTENT_TYPE);
        assert_eq!(guess_content_type("archive.unknown"), DEFAULT_CONTENT_TYPE);
    }
}
