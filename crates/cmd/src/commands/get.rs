use std::path::Path;

use anyhow::{Context, Result};
use bucketfs::FS;
use tokio::io::AsyncWriteExt;

/// Downloads `source` from the bucket into a local file.
pub async fn get_command(fs: &FS, source: &str, local: &Path) -> Result<u64> {
    let mut file = fs.open(source).await?;
    let mut target = tokio::fs::File::create(local)
        .await
        .with_context(|| format!("creating {}", local.display()))?;

    let copied = file.write_to(&mut target).await?;
    target.flush().await?;
    file.close();

    let local_name = local.display().to_string();
    diagnostics::log_info!("Downloaded {source} to {local_name} ({copied} bytes)", source: source, local_name: local_name, copied: copied);
    Ok(copied)
}
