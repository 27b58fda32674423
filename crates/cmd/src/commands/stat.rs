use std::io::Write;

use anyhow::Result;
use bucketfs::{FS, ModeField};

use crate::common::format_file_size;

pub async fn stat_command<W: Write>(fs: &FS, path: &str, out: &mut W) -> Result<()> {
    let info = fs.stat(path).await?;
    let mode = match info.mode_field() {
        ModeField::Parsed(mode) => format!("{:o} ({mode})", mode.perm()),
        ModeField::Missing => "none".to_string(),
        ModeField::Unparseable(raw) => format!("unreadable ({raw})"),
    };

    writeln!(out, "  Name: {}", info.name())?;
    writeln!(out, "  Type: {}", info.entry_type())?;
    writeln!(out, "  Size: {} ({})", info.size(), format_file_size(info.size()))?;
    writeln!(out, "  Mode: {mode}")?;
    writeln!(out, "  Modified: {}", info.modified().to_rfc3339())?;
    writeln!(out, "  Key: {}", info.key())?;
    if let Some(content_type) = info.content_type() {
        writeln!(out, "  Content-Type: {content_type}")?;
    }
    Ok(())
}
