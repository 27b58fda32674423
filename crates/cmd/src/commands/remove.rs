use anyhow::Result;
use bucketfs::FS;

pub async fn remove_command(fs: &FS, path: &str, recursive: bool) -> Result<()> {
    if recursive {
        fs.remove_all(path).await?;
    } else {
        fs.remove(path).await?;
    }
    diagnostics::log_info!("Removed {path}", path: path);
    Ok(())
}
