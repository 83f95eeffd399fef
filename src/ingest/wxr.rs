//! WordPress WXR export parser.
//!
//! WXR files are RSS documents: one `<channel>` holding blog metadata and a
//! flat list of `<item>` nodes that WordPress uses for every kind of post.
//! The parser streams events with quick-xml and yields an [`ExportDocument`]
//! with taxonomy and body-replacement rules already applied.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::convert::find_image_sources;
use crate::domain::{ChannelHeader, ExportDocument, Item};

/// Errors raised while reading an export file
#[derive(Debug, Error)]
pub enum WxrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid body_replace pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Export file has no <channel> element")]
    MissingChannel,
}

/// Item child elements captured verbatim (qualified names as WordPress
/// writes them)
const ITEM_FIELDS: &[&str] = &[
    "title",
    "link",
    "description",
    "dc:creator",
    "excerpt:encoded",
    "content:encoded",
    "wp:post_id",
    "wp:post_date_gmt",
    "wp:post_name",
    "wp:status",
    "wp:post_type",
    "wp:post_parent",
    "wp:comment_status",
];

/// Streaming WXR parser with the configured filtering rules baked in
pub struct WxrParser {
    taxonomy_filter: HashSet<String>,
    taxonomy_entry_filter: HashMap<String, String>,
    body_replace: Vec<(Regex, String)>,
}

/// Item under construction from XML events
#[derive(Debug, Default)]
struct PartialItem {
    title: Option<String>,
    link: Option<String>,
    author: Option<String>,
    date: Option<String>,
    description: Option<String>,
    slug: Option<String>,
    status: Option<String>,
    post_type: Option<String>,
    wp_id: Option<String>,
    parent: Option<String>,
    comments_open: bool,
    excerpt: Option<String>,
    body: String,
    taxonomies: BTreeMap<String, Vec<String>>,
}

impl WxrParser {
    /// Build a parser from the run configuration (compiles body_replace
    /// patterns)
    pub fn from_config(config: &Config) -> Result<Self, WxrError> {
        let mut body_replace = Vec::with_capacity(config.body_replace.len());
        for (pattern, replacement) in &config.body_replace {
            let regex = Regex::new(pattern).map_err(|source| WxrError::BadPattern {
                pattern: pattern.clone(),
                source,
            })?;
            body_replace.push((regex, replacement.clone()));
        }

        Ok(Self {
            taxonomy_filter: config.taxonomies.filter.clone(),
            taxonomy_entry_filter: config.taxonomies.entry_filter.clone(),
            body_replace,
        })
    }

    /// Parse one export file
    pub fn parse_file(&self, path: &Path) -> Result<ExportDocument, WxrError> {
        let file = File::open(path)?;
        self.parse_reader(BufReader::new(file))
    }

    /// Parse an export from any buffered reader
    pub fn parse_reader<R: BufRead>(&self, input: R) -> Result<ExportDocument, WxrError> {
        let mut reader = Reader::from_reader(input);
        let mut buf = Vec::with_capacity(8192);

        let mut header = ChannelHeader::default();
        let mut header_title: Option<String> = None;
        let mut header_link: Option<String> = None;
        let mut header_description: Option<String> = None;

        let mut items = Vec::new();
        let mut seen_channel = false;
        let mut current_item: Option<PartialItem> = None;
        let mut current_element: Option<String> = None;
        let mut pending_domain: Option<String> = None;
        let mut text_buf = String::new();

        loop {
            buf.clear();
            let event = reader.read_event_into(&mut buf)?;

            match event {
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    match name.as_str() {
                        "channel" => seen_channel = true,
                        "item" => current_item = Some(PartialItem::default()),
                        "category" if current_item.is_some() => {
                            pending_domain = e
                                .attributes()
                                .flatten()
                                .find(|a| a.key.as_ref() == b"domain")
                                .map(|a| String::from_utf8_lossy(&a.value).to_string());
                            current_element = Some(name);
                            text_buf.clear();
                        }
                        _ if current_item.is_some() && ITEM_FIELDS.contains(&name.as_str()) => {
                            current_element = Some(name);
                            text_buf.clear();
                        }
                        "title" | "link" | "description" if current_item.is_none() => {
                            current_element = Some(name);
                            text_buf.clear();
                        }
                        _ => {}
                    }
                }
                Event::Text(ref e) => {
                    if current_element.is_some() {
                        match e.unescape() {
                            Ok(text) => text_buf.push_str(&text),
                            Err(_) => text_buf.push_str(&String::from_utf8_lossy(e)),
                        }
                    }
                }
                Event::CData(ref e) => {
                    if current_element.is_some() {
                        text_buf.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    if name == "item" {
                        if let Some(partial) = current_item.take() {
                            if let Some(done) = self.finalize_item(partial) {
                                items.push(done);
                            }
                        }
                    } else if let Some(ref mut item) = current_item {
                        match name.as_str() {
                            "category" => {
                                if let Some(domain) = pending_domain.take() {
                                    self.record_taxonomy(item, domain, text_buf.trim());
                                }
                            }
                            "content:encoded" => item.body = text_buf.clone(),
                            "excerpt:encoded" => item.excerpt = non_empty(&text_buf),
                            "title" => item.title = non_empty(text_buf.trim()),
                            "link" => item.link = non_empty(text_buf.trim()),
                            "description" => item.description = non_empty(text_buf.trim()),
                            "dc:creator" => item.author = non_empty(text_buf.trim()),
                            "wp:post_id" => item.wp_id = non_empty(text_buf.trim()),
                            "wp:post_date_gmt" => item.date = non_empty(text_buf.trim()),
                            "wp:post_name" => item.slug = non_empty(text_buf.trim()),
                            "wp:status" => item.status = non_empty(text_buf.trim()),
                            "wp:post_type" => item.post_type = non_empty(text_buf.trim()),
                            "wp:post_parent" => {
                                item.parent = non_empty(text_buf.trim()).filter(|p| p != "0");
                            }
                            "wp:comment_status" => item.comments_open = text_buf.trim() == "open",
                            _ => {}
                        }
                    } else {
                        match name.as_str() {
                            "title" if header_title.is_none() => {
                                header_title = Some(text_buf.trim().to_string());
                            }
                            "link" if header_link.is_none() => {
                                header_link = Some(text_buf.trim().to_string());
                            }
                            "description" if header_description.is_none() => {
                                header_description = Some(text_buf.trim().to_string());
                            }
                            _ => {}
                        }
                    }

                    if current_element.as_deref() == Some(name.as_str()) {
                        current_element = None;
                        text_buf.clear();
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_channel {
            return Err(WxrError::MissingChannel);
        }

        header.title = header_title.unwrap_or_default();
        header.link = header_link.unwrap_or_default();
        header.description = header_description.unwrap_or_default();

        Ok(ExportDocument { header, items })
    }

    /// Apply taxonomy filters and record a term on a partial item
    fn record_taxonomy(&self, item: &mut PartialItem, domain: String, value: &str) {
        if value.is_empty() || self.taxonomy_filter.contains(&domain) {
            return;
        }
        if self.taxonomy_entry_filter.get(&domain).map(String::as_str) == Some(value) {
            return;
        }
        item.taxonomies
            .entry(domain)
            .or_default()
            .push(value.to_string());
    }

    /// Turn a completed partial into an Item, applying body rules and the
    /// image scan. Items without an ID or type are malformed and dropped.
    fn finalize_item(&self, partial: PartialItem) -> Option<Item> {
        let wp_id = match partial.wp_id {
            Some(id) => id,
            None => {
                warn!(
                    title = partial.title.as_deref().unwrap_or("<untitled>"),
                    "item has no wp:post_id, skipping"
                );
                return None;
            }
        };
        let post_type = match partial.post_type {
            Some(t) => t,
            None => {
                warn!(%wp_id, "item has no wp:post_type, skipping");
                return None;
            }
        };

        let mut body = partial.body;
        for (regex, replacement) in &self.body_replace {
            body = regex.replace_all(&body, replacement.as_str()).into_owned();
        }

        let image_sources = find_image_sources(&body);

        Some(Item {
            wp_id,
            parent: partial.parent,
            post_type,
            slug: partial.slug,
            title: partial.title,
            link: partial.link,
            author: partial.author,
            date: partial.date,
            description: partial.description,
            status: partial.status,
            excerpt: partial.excerpt,
            comments_open: partial.comments_open,
            taxonomies: partial.taxonomies,
            body,
            image_sources,
            uid: None,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
