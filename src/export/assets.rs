//! Local asset path assignment.
//!
//! When image localization is on, every image URL referenced by an item is
//! assigned a stable path under the blog's `assets/` tree. Assignments are
//! cached per owning item so repeated references resolve identically, and
//! filename collisions are disambiguated within one owner only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Asset storage layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `assets/{owner}/{file}` - one directory per owning item
    Hierarchical,

    /// `assets/{owner}_{file}` - flat directory, owner folded into the name
    Flat,
}

/// Owner key -> source URL -> assigned filename.
///
/// Same ownership pattern as [`UidTable`](super::UidTable): constructed per
/// run, grows monotonically.
#[derive(Debug, Default)]
pub struct AttachmentTable {
    by_owner: HashMap<String, HashMap<String, String>>,
}

impl AttachmentTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the local path for `src` owned by `owner`, creating the
    /// target directory.
    ///
    /// Does not download anything; retrieval is the fetcher's job. Repeated
    /// calls with the same (owner, src) pair return the cached path.
    pub fn resolve(
        &mut self,
        src: &str,
        owner: &str,
        blog_root: &Path,
        layout: Layout,
    ) -> Result<PathBuf> {
        let files = self.by_owner.entry(owner.to_string()).or_default();

        let filename = match files.get(src) {
            Some(name) => name.clone(),
            None => {
                let (root, ext) = split_url_basename(src);
                let mut candidate = format!("{}{}", root, ext);
                let mut infix = 1u32;
                while files.values().any(|taken| taken == &candidate) {
                    candidate = format!("{}-{}{}", root, infix, ext);
                    infix += 1;
                }
                files.insert(src.to_string(), candidate.clone());
                candidate
            }
        };

        let (target_dir, target_file) = match layout {
            Layout::Hierarchical => {
                let dir = blog_root.join("assets").join(owner);
                let file = dir.join(&filename);
                (dir, file)
            }
            Layout::Flat => {
                let dir = blog_root.join("assets");
                let file = dir.join(format!("{}_{}", owner, filename));
                (dir, file)
            }
        };

        std::fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create asset directory: {}", target_dir.display()))?;

        Ok(target_file)
    }
}

/// Blog-root-relative reference for a computed asset path.
///
/// This is the form substituted into item bodies: blog root stripped,
/// forward slashes, leading `/`.
pub fn relative_reference(path: &Path, blog_root: &Path) -> String {
    let stripped = path.strip_prefix(blog_root).unwrap_or(path);
    let joined = stripped
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}", joined)
}

/// Split a URL's path basename into (root, extension)
fn split_url_basename(src: &str) -> (String, String) {
    // Path component only: no query, no fragment, no authority
    let path = match reqwest::Url::parse(src) {
        Ok(url) => url.path().to_string(),
        Err(_) => src
            .split(['?', '#'])
            .next()
            .unwrap_or("")
            .to_string(),
    };

    let basename = path.rsplit('/').next().unwrap_or("");
    let (root, ext) = match basename.rfind('.') {
        Some(idx) if idx > 0 => (&basename[..idx], &basename[idx..]),
        _ => (basename, ""),
    };

    if root.is_empty() {
        ("1".to_string(), ext.to_string())
    } else {
        (root.to_string(), ext.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hierarchical_path() {
        let temp = TempDir::new().unwrap();
        let mut table = AttachmentTable::new();

        let path = table
            .resolve("http://example.com/a/b.png", "my-post", temp.path(), Layout::Hierarchical)
            .unwrap();

        assert_eq!(path, temp.path().join("assets").join("my-post").join("b.png"));
        assert!(temp.path().join("assets").join("my-post").is_dir());
    }

    #[test]
    fn test_flat_path() {
        let temp = TempDir::new().unwrap();
        let mut table = AttachmentTable::new();

        let path = table
            .resolve("http://example.com/a/b.png", "my-post", temp.path(), Layout::Flat)
            .unwrap();

        assert_eq!(path, temp.path().join("assets").join("my-post_b.png"));
    }

    #[test]
    fn test_repeated_resolution_is_cached() {
        let temp = TempDir::new().unwrap();
        let mut table = AttachmentTable::new();

        let first = table
            .resolve("http://example.com/img.jpg", "post", temp.path(), Layout::Hierarchical)
            .unwrap();
        let second = table
            .resolve("http://example.com/img.jpg", "post", temp.path(), Layout::Hierarchical)
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_collisions_scoped_per_owner() {
        let temp = TempDir::new().unwrap();
        let mut table = AttachmentTable::new();

        // Two different sources with the same basename under one owner
        let a = table
            .resolve("http://example.com/a/img.jpg", "post", temp.path(), Layout::Hierarchical)
            .unwrap();
        let b = table
            .resolve("http://example.com/b/img.jpg", "post", temp.path(), Layout::Hierarchical)
            .unwrap();
        assert_eq!(a.file_name().unwrap(), "img.jpg");
        assert_eq!(b.file_name().unwrap(), "img-1.jpg");

        // Same basename under a different owner: no renaming
        let c = table
            .resolve("http://example.com/c/img.jpg", "other", temp.path(), Layout::Hierarchical)
            .unwrap();
        assert_eq!(c.file_name().unwrap(), "img.jpg");
    }

    #[test]
    fn test_empty_basename_uses_placeholder() {
        let temp = TempDir::new().unwrap();
        let mut table = AttachmentTable::new();

        let path = table
            .resolve("http://example.com/images/", "post", temp.path(), Layout::Hierarchical)
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "1");
    }

    #[test]
    fn test_query_string_ignored() {
        let temp = TempDir::new().unwrap();
        let mut table = AttachmentTable::new();

        let path = table
            .resolve(
                "http://example.com/photo.png?w=1024&h=768",
                "post",
                temp.path(),
                Layout::Hierarchical,
            )
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "photo.png");
    }

    #[test]
    fn test_relative_reference() {
        let blog_root = Path::new("/build/jekyll/example.com");
        let path = blog_root.join("assets").join("uid").join("b.png");
        assert_eq!(relative_reference(&path, blog_root), "/assets/uid/b.png");
    }
}
