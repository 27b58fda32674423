use std::io::Write;

use anyhow::Result;
use bucketfs::FS;

use crate::common::format_long;

/// Lists a directory, or describes a single file.
pub async fn list_command<W: Write>(fs: &FS, path: &str, long: bool, out: &mut W) -> Result<()> {
    diagnostics::log_debug!("ls {path}", path: path);

    let info = fs.stat(path).await?;
    if !info.is_dir() {
        if long {
            writeln!(out, "{}", format_long(&info))?;
        } else {
            writeln!(out, "{}", info.name())?;
        }
        return Ok(());
    }

    for entry in fs.read_dir(path).await? {
        if long {
            writeln!(out, "{}", format_long(entry.info()))?;
        } else if entry.is_dir() {
            writeln!(out, "{}/", entry.name())?;
        } else {
            writeln!(out, "{}", entry.name())?;
        }
    }
    Ok(())
}
