//! Destination path computation.
//!
//! Posts land flat under `_posts/`; pages become nested `index` files whose
//! directories mirror the source blog's parent/child page hierarchy.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::domain::Item;

use super::uid::UidTable;

/// Uid namespace for page items (posts use the default namespace)
pub const PAGE_NAMESPACE: &str = "page";

/// Root of the output tree for one blog: `{build_dir}/jekyll/{name}`, where
/// the name is the channel link with its scheme stripped and unsafe
/// characters removed.
pub fn blog_root(build_dir: &Path, channel_link: &str) -> PathBuf {
    let trimmed = channel_link
        .strip_prefix("https")
        .or_else(|| channel_link.strip_prefix("http"))
        .unwrap_or(channel_link);

    let name: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    build_dir.join("jekyll").join(name)
}

/// Computes per-item destination paths under one blog root
pub struct PathResolver {
    blog_root: PathBuf,
    extension: String,
    date_format: String,
}

impl PathResolver {
    /// Create a resolver for a blog root and target extension
    pub fn new(
        blog_root: impl Into<PathBuf>,
        extension: impl Into<String>,
        date_format: impl Into<String>,
    ) -> Self {
        Self {
            blog_root: blog_root.into(),
            extension: extension.into(),
            date_format: date_format.into(),
        }
    }

    /// The blog root this resolver writes under
    pub fn blog_root(&self) -> &Path {
        &self.blog_root
    }

    /// Destination for a post: `{blog_root}/_posts/{uid}.{ext}`
    pub fn post_path(&self, uid: &str) -> Result<PathBuf> {
        let dir = self.blog_root.join("_posts");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        Ok(dir.join(format!("{}.{}", uid, self.extension)))
    }

    /// Destination for a page: `{blog_root}/{parents...}/{uid}/index.{ext}`.
    ///
    /// The parent chain is walked through `items` by wp_id; a parent missing
    /// from the export truncates the chain with a warning and the path built
    /// so far is kept.
    pub fn page_path(&self, item: &Item, items: &[Item], uids: &mut UidTable) -> Result<PathBuf> {
        let uid = uids.assign(item, PAGE_NAMESPACE, false, &self.date_format);

        let mut prefix = PathBuf::new();
        let mut parent_id = item.parent.clone();
        while let Some(wp_id) = parent_id {
            match items.iter().find(|p| p.wp_id == wp_id) {
                Some(parent) => {
                    let parent_uid = uids.assign(parent, PAGE_NAMESPACE, false, &self.date_format);
                    prefix = Path::new(&parent_uid).join(&prefix);
                    parent_id = parent.parent.clone();
                }
                None => {
                    warn!(
                        page = item.title.as_deref().unwrap_or("<untitled>"),
                        missing_parent = %wp_id,
                        "parent item not in export, truncating page hierarchy"
                    );
                    break;
                }
            }
        }

        let dir = self.blog_root.join(prefix).join(&uid);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        Ok(dir.join(format!("index.{}", self.extension)))
    }
}
