use anyhow::Result;
use bucketfs::{FS, FileMode};

pub async fn chmod_command(fs: &FS, mode: FileMode, path: &str) -> Result<()> {
    fs.chmod(path, mode).await?;
    let bits = mode.encode();
    diagnostics::log_info!("Changed mode of {path} to {bits}", path: path, bits: bits);
    Ok(())
}
