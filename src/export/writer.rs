//! Item export orchestration.
//!
//! Drives one run: assigns uids, resolves destination paths, optionally
//! localizes images, serializes front matter, and writes the transformed
//! body. Items are processed strictly in document order; the uid and
//! attachment tables live only for the duration of one export.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_yaml::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::convert::render_body;
use crate::domain::{ExportDocument, Item, ItemType};
use crate::fetch::{absolutize, download_url, HttpFetcher, ImageFetcher};

use super::assets::{relative_reference, AttachmentTable};
use super::paths::{blog_root, PathResolver, PAGE_NAMESPACE};
use super::uid::{item_datetime, UidTable};

/// Counters for one export run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    /// Items written to disk
    pub written: usize,

    /// Items dropped by filters or unknown type
    pub skipped: usize,

    /// Items abandoned because of an I/O failure
    pub failed: usize,

    /// Successful image downloads
    pub images_downloaded: usize,

    /// Failed image downloads (body still rewritten)
    pub images_failed: usize,
}

/// Writes one parsed export into the output tree
pub struct Exporter {
    config: Config,
    fetcher: Box<dyn ImageFetcher>,
}

impl Exporter {
    /// Create an exporter with the production HTTP fetcher
    pub fn new(config: Config) -> Self {
        Self::with_fetcher(config, Box::new(HttpFetcher::new()))
    }

    /// Create an exporter with a custom fetcher (used by tests)
    pub fn with_fetcher(config: Config, fetcher: Box<dyn ImageFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Export every item of `doc`, sequentially and in document order.
    ///
    /// Per-item failures are reported and counted without aborting the
    /// rest of the batch.
    #[instrument(skip(self, doc), fields(blog = %doc.header.title))]
    pub async fn export(&self, doc: &mut ExportDocument) -> Result<ExportStats> {
        let root = blog_root(&self.config.build_dir(), &doc.header.link);
        let resolver = PathResolver::new(
            root.clone(),
            self.config.target_format.clone(),
            self.config.date_format.clone(),
        );

        // Disambiguation state, fresh for this run
        let mut uids = UidTable::new();
        let mut attachments = AttachmentTable::new();
        let mut stats = ExportStats::default();

        info!(root = %root.display(), items = doc.items.len(), "writing export");

        for idx in 0..doc.items.len() {
            match self
                .export_item(idx, doc, &resolver, &mut uids, &mut attachments, &mut stats)
                .await
            {
                Ok(true) => stats.written += 1,
                Ok(false) => stats.skipped += 1,
                Err(e) => {
                    error!(
                        title = doc.items[idx].title.as_deref().unwrap_or("<untitled>"),
                        error = %e,
                        "failed to export item"
                    );
                    stats.failed += 1;
                }
            }
        }

        info!(
            written = stats.written,
            skipped = stats.skipped,
            failed = stats.failed,
            "export done"
        );
        Ok(stats)
    }

    /// Process one item. Returns Ok(false) when the item was filtered or
    /// its type is not exportable.
    async fn export_item(
        &self,
        idx: usize,
        doc: &mut ExportDocument,
        resolver: &PathResolver,
        uids: &mut UidTable,
        attachments: &mut AttachmentTable,
        stats: &mut ExportStats,
    ) -> Result<bool> {
        if self.config.item_type_filter.contains(&doc.items[idx].post_type) {
            return Ok(false);
        }

        for (field, value) in &self.config.item_field_filter {
            if doc.items[idx].field(field) == Some(value.as_str()) {
                debug!(field, value, "item dropped by field filter");
                return Ok(false);
            }
        }

        let (uid, dest, template) = match doc.items[idx].item_type() {
            ItemType::Post => {
                let uid = uids.assign(&doc.items[idx], "", true, &self.config.date_format);
                let dest = resolver.post_path(&uid)?;
                (uid, dest, "blog-post")
            }
            ItemType::Page => {
                let uid = uids.assign(
                    &doc.items[idx],
                    PAGE_NAMESPACE,
                    false,
                    &self.config.date_format,
                );
                let dest = resolver.page_path(&doc.items[idx], &doc.items, uids)?;
                (uid, dest, "page")
            }
            other => {
                warn!(
                    item_type = %other,
                    wp_id = %doc.items[idx].wp_id,
                    "unknown item type, skipping"
                );
                return Ok(false);
            }
        };

        let base_link = doc.header.link.clone();
        let item = &mut doc.items[idx];
        item.uid = Some(uid.clone());

        // Featured image: local path when downloads ran, else the absolute
        // URL of the first referenced image, else empty.
        let mut featured = item
            .image_sources
            .first()
            .map(|src| absolutize(&base_link, src))
            .unwrap_or_default();

        if self.config.download_images {
            featured = self
                .localize_images(item, &uid, resolver.blog_root(), &base_link, attachments, stats)
                .await?;
        }

        let front = self.front_matter(item, template, &featured)?;
        let body = render_body(&item.body, &self.config.target_format);
        let output = format!("---\n{}---\n\n{}", front, body);

        tokio::fs::write(&dest, output)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        debug!(path = %dest.display(), "wrote item");
        Ok(true)
    }

    /// Download the item's images and rewrite body references to their local
    /// paths. Returns the featured image reference (first image, relative).
    ///
    /// The rewrite happens whether or not a download succeeds: once a local
    /// path has been computed the body must not keep the absolute URL.
    async fn localize_images(
        &self,
        item: &mut Item,
        uid: &str,
        blog_root: &Path,
        base_link: &str,
        attachments: &mut AttachmentTable,
        stats: &mut ExportStats,
    ) -> Result<String> {
        let mut featured = String::new();
        let sources = item.image_sources.clone();

        for (i, src) in sources.iter().enumerate() {
            let url = absolutize(base_link, src);
            let dest = attachments.resolve(src, uid, blog_root, self.config.layout())?;
            let relpath = relative_reference(&dest, blog_root);

            if dest.is_file() && !self.config.replace_existing {
                info!(path = %dest.display(), "asset already present, skipping download");
            } else {
                match self.fetcher.fetch(&download_url(&url), &dest).await {
                    Ok(()) => {
                        stats.images_downloaded += 1;
                        debug!(%url, path = %dest.display(), "downloaded image");
                    }
                    Err(e) => {
                        stats.images_failed += 1;
                        warn!(%url, error = %e, "unable to download image");
                    }
                }
            }

            item.body = item.body.replace(&url, &relpath);
            if src != &url {
                item.body = item.body.replace(src.as_str(), &relpath);
            }

            if i == 0 {
                featured = relpath;
            }
        }

        Ok(featured)
    }

    /// Serialize the YAML front matter: the metadata block followed by the
    /// taxonomy block, both with deterministic key order.
    fn front_matter(&self, item: &Item, template: &str, featured: &str) -> Result<String> {
        let date = item_datetime(item, &self.config.date_format);

        let mut header: BTreeMap<&str, Value> = BTreeMap::new();
        header.insert("title", Value::from(item.title.clone().unwrap_or_default()));
        header.insert(
            "date",
            Value::from(date.format(&self.config.date_format).to_string()),
        );
        header.insert(
            "description",
            Value::from(item.description.clone().unwrap_or_default()),
        );
        header.insert(
            "slug",
            Value::from(format!("/{}", item.slug.as_deref().unwrap_or_default())),
        );
        if let Some(excerpt) = item.excerpt.as_deref().filter(|e| !e.is_empty()) {
            header.insert("excerpt", Value::from(excerpt));
        }
        if item.status.as_deref() != Some("publish") {
            header.insert("published", Value::from(false));
        }
        header.insert("featuredImage", Value::from(featured));
        header.insert("template", Value::from(template));

        let mut out =
            serde_yaml::to_string(&header).context("Failed to serialize front matter")?;

        if !item.taxonomies.is_empty() {
            let mut tax: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (domain, values) in &item.taxonomies {
                let name = self
                    .config
                    .taxonomies
                    .name_mapping
                    .get(domain)
                    .cloned()
                    .unwrap_or_else(|| domain.clone());
                let terms = tax.entry(name).or_default();
                for value in values {
                    if !terms.contains(value) {
                        terms.push(value.clone());
                    }
                }
            }
            out.push_str(
                &serde_yaml::to_string(&tax).context("Failed to serialize taxonomies")?,
            );
        }

        Ok(out)
    }
}
