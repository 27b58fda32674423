use std::io::Write;

use anyhow::Result;
use async_trait::async_trait;
use bucketfs::{DirEntry, FS, Visitor, Walk};

/// Collects indented lines; depth comes from the number of path segments
/// below the walk root.
struct TreeVisitor {
    base_depth: usize,
    lines: Vec<String>,
}

fn depth(path: &str) -> usize {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .count()
}

#[async_trait]
impl Visitor for TreeVisitor {
    async fn visit(&mut self, path: &str, entry: &DirEntry) -> bucketfs::Result<Walk> {
        let (level, name) = if self.lines.is_empty() {
            (0, path)
        } else {
            (depth(path).saturating_sub(self.base_depth), entry.name())
        };
        let suffix = if entry.is_dir() && !name.ends_with('/') { "/" } else { "" };
        self.lines
            .push(format!("{}{name}{suffix}", "  ".repeat(level)));
        Ok(Walk::Continue)
    }

    async fn visit_error(&mut self, path: &str, error: bucketfs::Error) -> bucketfs::Result<Walk> {
        if !error.is_not_found() || self.lines.is_empty() {
            return Err(error);
        }
        let error = error.to_string();
        diagnostics::log_warn!("Skipping {path}: {error}", path: path, error: error);
        Ok(Walk::Continue)
    }
}

pub async fn tree_command<W: Write>(fs: &FS, path: &str, out: &mut W) -> Result<()> {
    let key = fs.names().key(path)?;
    let base_depth = if fs.names().is_root(&key) { 0 } else { depth(&key) };
    let mut visitor = TreeVisitor {
        base_depth,
        lines: Vec::new(),
    };
    fs.walk_dir(path, &mut visitor).await?;
    for line in visitor.lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
