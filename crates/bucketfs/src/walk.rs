// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;

use crate::error::{Error, Result};
use crate::fs::FS;
use crate::info::DirEntry;

/// What a visitor wants the walk to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    /// On a directory: do not descend into it. On a file: skip the rest of
    /// the enclosing directory.
    SkipDir,
    /// Stop the walk; `walk_dir` returns `Ok`.
    SkipAll,
}

/// Trait for visiting entries during a tree walk
#[async_trait]
pub trait Visitor: Send {
    /// Called for each entry, parents before children.
    async fn visit(&mut self, path: &str, entry: &DirEntry) -> Result<Walk>;

    /// Called when `path` cannot be stated or listed. Returning the error
    /// aborts the walk.
    async fn visit_error(&mut self, path: &str, error: Error) -> Result<Walk> {
        _ = path;
        Err(error)
    }
}

/// Simple visitor that collects every entry
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    pub results: Vec<(String, DirEntry)>,
}

impl CollectingVisitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        self.results.iter().map(|(path, _)| path.as_str()).collect()
    }
}

#[async_trait]
impl Visitor for CollectingVisitor {
    async fn visit(&mut self, path: &str, entry: &DirEntry) -> Result<Walk> {
        self.results.push((path.to_string(), entry.clone()));
        Ok(Walk::Continue)
    }
}

impl FS {
    /// Depth-first, preorder walk starting at (and including) `root`.
    /// Siblings are visited in name order.
    pub async fn walk_dir<V>(&self, root: &str, visitor: &mut V) -> Result<()>
    where
        V: Visitor + ?Sized,
    {
        diagnostics::log_debug!("walk_dir {root}", root: root);
        let entry = match self.stat(root).await {
            Ok(info) => DirEntry::new(info),
            Err(e) => {
                _ = visitor.visit_error(root, e).await?;
                return Ok(());
            }
        };
        _ = self.walk_entry(root.to_string(), entry, visitor).await?;
        Ok(())
    }

    fn walk_entry<'a, V>(
        &'a self,
        path: String,
        entry: DirEntry,
        visitor: &'a mut V,
    ) -> Pin<Box<dyn Future<Output = Result<Walk>> + Send + 'a>>
    where
        V: Visitor + ?Sized,
    {
        Box::pin(async move {
            match visitor.visit(&path, &entry).await? {
                Walk::SkipAll => return Ok(Walk::SkipAll),
                Walk::SkipDir if entry.is_dir() => return Ok(Walk::Continue),
                Walk::SkipDir => return Ok(Walk::SkipDir),
                Walk::Continue => {}
            }
            if !entry.is_dir() {
                return Ok(Walk::Continue);
            }

            let children = match self.read_dir(&path).await {
                Ok(children) => children,
                Err(e) => {
                    return match visitor.visit_error(&path, e).await? {
                        Walk::SkipAll => Ok(Walk::SkipAll),
                        Walk::Continue | Walk::SkipDir => Ok(Walk::Continue),
                    };
                }
            };

            let dir_key = self.names().key(&path)?;
            for child in children {
                let child_path = self.names().join(&dir_key, child.name());
                match self.walk_entry(child_path, child, visitor).await? {
                    Walk::SkipAll => return Ok(Walk::SkipAll),
                    Walk::SkipDir => break,
                    Walk::Continue => {}
                }
            }
            Ok(Walk::Continue)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::new_fs;
    use crate::metadata::FileMode;

    async fn populated() -> FS {
        let fs = new_fs().await;
        for path in ["a/x", "a/sub/y", "b/z", "c"] {
            fs.write_file(path, "data", FileMode::new(0o644))
                .await
                .unwrap();
        }
        fs
    }

    #[tokio::test]
    async fn test_walk_preorder() {
        let fs = populated().await;
        let mut visitor = CollectingVisitor::new();
        fs.walk_dir("/", &mut visitor).await.unwrap();
        assert_eq!(
            visitor.paths(),
            vec!["/", "a", "a/sub", "a/sub/y", "a/x", "b", "b/z", "c"]
        );
        assert!(visitor.results[0].1.is_dir());
    }

    struct Skipper {
        seen: Vec<String>,
        skip_dir: &'static str,
        stop_at: &'static str,
    }

    #[async_trait]
    impl Visitor for Skipper {
        async fn visit(&mut self, path: &str, _entry: &DirEntry) -> Result<Walk> {
            self.seen.push(path.to_string());
            if path == self.skip_dir {
                Ok(Walk::SkipDir)
            } else if path == self.stop_at {
                Ok(Walk::SkipAll)
            } else {
                Ok(Walk::Continue)
            }
        }
    }

    #[tokio::test]
    async fn test_walk_skip_dir_and_all() {
        let fs = populated().await;
        let mut visitor = Skipper {
            seen: Vec::new(),
            skip_dir: "a",
            stop_at: "b/z",
        };
        fs.walk_dir(".", &mut visitor).await.unwrap();
        assert_eq!(visitor.seen, vec![".", "a", "b", "b/z"]);
    }

    #[tokio::test]
    async fn test_walk_skip_dir_on_file_skips_siblings() {
        let fs = populated().await;
        let mut visitor = Skipper {
            seen: Vec::new(),
            skip_dir: "a/sub/y",
            stop_at: "",
        };
        fs.walk_dir("a", &mut visitor).await.unwrap();
        assert_eq!(visitor.seen, vec!["a", "a/sub", "a/sub/y", "a/x"]);
    }

    #[tokio::test]
    async fn test_walk_missing_root_reports_error() {
        let fs = new_fs().await;
        let mut visitor = CollectingVisitor::new();
        let err = fs.walk_dir("nowhere", &mut visitor).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(visitor.results.is_empty());
    }

    struct Failing;

    #[async_trait]
    impl Visitor for Failing {
        async fn visit(&mut self, path: &str, _entry: &DirEntry) -> Result<Walk> {
            if path == "b" {
                Err(Error::invalid_path("b"))
            } else {
                Ok(Walk::Continue)
            }
        }
    }

    #[tokio::test]
    async fn test_visitor_error_aborts() {
        let fs = populated().await;
        let err = fs.walk_dir("", &mut Failing).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPath(p) if p == "b"));
    }
}
