use anyhow::Result;
use bucketfs::FS;

pub async fn rename_command(fs: &FS, from: &str, to: &str) -> Result<()> {
    fs.rename(from, to).await?;
    diagnostics::log_info!("Moved {from} to {to}", from: from, to: to);
    Ok(())
}
