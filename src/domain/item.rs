//! Exported content records.
//!
//! An `Item` is one `<item>` node from a WordPress WXR export: a post, a
//! page, an attachment, or any other registered post type. Items are built
//! once by the WXR parser and mutated by the exporter (uid assignment, body
//! rewriting) before being written out.

use std::collections::BTreeMap;

/// Recognized WordPress item types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemType {
    /// A blog post (written under `_posts/`)
    Post,

    /// A page (written as a nested `index` file)
    Page,

    /// A media attachment
    Attachment,

    /// Any other registered post type (nav_menu_item, revision, ...)
    Other(String),
}

impl ItemType {
    /// Classify a raw `wp:post_type` value
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "post" => ItemType::Post,
            "page" => ItemType::Page,
            "attachment" => ItemType::Attachment,
            other => ItemType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemType::Post => write!(f, "post"),
            ItemType::Page => write!(f, "page"),
            ItemType::Attachment => write!(f, "attachment"),
            ItemType::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// One content unit from the export
#[derive(Debug, Clone, Default)]
pub struct Item {
    /// WordPress post ID (`wp:post_id`), stable within the source blog
    pub wp_id: String,

    /// Parent item's wp_id (`wp:post_parent`), `None` when the export says `0`
    pub parent: Option<String>,

    /// Raw post type (`wp:post_type`)
    pub post_type: String,

    /// URL slug (`wp:post_name`)
    pub slug: Option<String>,

    /// Item title
    pub title: Option<String>,

    /// Permalink on the source blog
    pub link: Option<String>,

    /// Author (`dc:creator`)
    pub author: Option<String>,

    /// Publication date (`wp:post_date_gmt`), in the configured date format
    pub date: Option<String>,

    /// Short description
    pub description: Option<String>,

    /// Publication status (`wp:status`), `"publish"` for live items
    pub status: Option<String>,

    /// Hand-written excerpt (`excerpt:encoded`)
    pub excerpt: Option<String>,

    /// Whether comments were open (`wp:comment_status`)
    pub comments_open: bool,

    /// Taxonomy domain -> term values, already filtered per configuration
    pub taxonomies: BTreeMap<String, Vec<String>>,

    /// Raw body markup (`content:encoded`), rewritten in place when images
    /// are localized
    pub body: String,

    /// `<img src>` URLs found in the body, in document order
    pub image_sources: Vec<String>,

    /// Output identifier, assigned by the exporter
    pub uid: Option<String>,
}

impl Item {
    /// Classified item type
    pub fn item_type(&self) -> ItemType {
        ItemType::from_raw(&self.post_type)
    }

    /// Look up a field by its configuration name (for `item_field_filter`)
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "wp_id" => Some(&self.wp_id),
            "parent" => self.parent.as_deref(),
            "type" => Some(&self.post_type),
            "slug" => self.slug.as_deref(),
            "title" => self.title.as_deref(),
            "link" => self.link.as_deref(),
            "author" => self.author.as_deref(),
            "date" => self.date.as_deref(),
            "description" => self.description.as_deref(),
            "status" => self.status.as_deref(),
            _ => None,
        }
    }
}

/// `<channel>`-level metadata from the export
#[derive(Debug, Clone, Default)]
pub struct ChannelHeader {
    /// Blog title
    pub title: String,

    /// Blog URL (used to absolutize relative image references and to name
    /// the output tree)
    pub link: String,

    /// Blog tagline, empty when absent
    pub description: String,
}

/// A fully parsed export file
#[derive(Debug, Clone, Default)]
pub struct ExportDocument {
    /// Channel metadata
    pub header: ChannelHeader,

    /// Items in document order
    pub items: Vec<Item>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_classification() {
        assert_eq!(ItemType::from_raw("post"), ItemType::Post);
        assert_eq!(ItemType::from_raw("page"), ItemType::Page);
        assert_eq!(ItemType::from_raw("attachment"), ItemType::Attachment);
        assert_eq!(
            ItemType::from_raw("nav_menu_item"),
            ItemType::Other("nav_menu_item".to_string())
        );
    }

    #[test]
    fn test_field_lookup() {
        let item = Item {
            wp_id: "12".to_string(),
            post_type: "post".to_string(),
            status: Some("draft".to_string()),
            ..Default::default()
        };

        assert_eq!(item.field("wp_id"), Some("12"));
        assert_eq!(item.field("status"), Some("draft"));
        assert_eq!(item.field("slug"), None);
        assert_eq!(item.field("no_such_field"), None);
    }
}
