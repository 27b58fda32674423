use anyhow::Result;
use bucketfs::{FS, FileMode};

pub async fn mkdir_command(fs: &FS, path: &str, parents: bool, mode: FileMode) -> Result<()> {
    diagnostics::log_debug!("Creating directory {path}", path: path);
    if parents {
        fs.mkdir_all(path, mode).await?;
    } else {
        fs.mkdir(path, mode).await?;
    }
    diagnostics::log_info!("Directory created successfully: {path}", path: path);
    Ok(())
}
