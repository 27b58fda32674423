use std::path::Path;

use anyhow::{Context, Result, anyhow};
use bucketfs::{FS, FileMode};

/// Uploads a local file. When `dest` names an existing directory the local
/// file name is kept.
pub async fn put_command(fs: &FS, local: &Path, dest: &str, mode: FileMode) -> Result<String> {
    let mut source = tokio::fs::File::open(local)
        .await
        .with_context(|| format!("opening {}", local.display()))?;

    let target = match fs.stat(dest).await {
        Ok(info) if info.is_dir() => {
            let name = local
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow!("{} has no usable file name", local.display()))?;
            format!("{}/{name}", dest.trim_end_matches('/'))
        }
        _ => dest.to_string(),
    };

    let copied = fs.write_from(&target, &mut source, mode).await?;
    let uploaded = target.as_str();
    diagnostics::log_info!("Uploaded {uploaded} ({copied} bytes)", uploaded: uploaded, copied: copied);
    Ok(target)
}
