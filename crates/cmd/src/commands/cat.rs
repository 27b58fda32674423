use anyhow::Result;
use bucketfs::FS;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Streams a file to `out`, returning the byte count.
pub async fn cat_command<W>(fs: &FS, path: &str, out: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut file = fs.open(path).await?;
    let copied = file.write_to(out).await?;
    out.flush().await?;
    file.close();
    diagnostics::log_debug!("cat {path}: {copied} bytes", path: path, copied: copied);
    Ok(copied)
}
