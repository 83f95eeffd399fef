//! Body markup conversion.
//!
//! Items carry raw HTML from the export. The `html` target passes it
//! through untouched; any other target renders readable text/markdown.

use scraper::{Html, Selector};
use tracing::warn;

/// File extension / format identifier for pass-through HTML output
pub const HTML_FORMAT: &str = "html";

/// Render an item body for the configured target format.
///
/// Conversion failures degrade to the raw body rather than losing the item.
pub fn render_body(html: &str, target_format: &str) -> String {
    if target_format == HTML_FORMAT {
        return html.to_string();
    }

    match html2text::from_read(html.as_bytes(), 80) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "could not convert body markup, keeping raw HTML");
            html.to_string()
        }
    }
}

/// Collect `<img src>` URLs from a body, in document order.
///
/// A URL referenced more than once is reported once.
pub fn find_image_sources(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);

    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    let mut sources: Vec<String> = Vec::new();
    for img in fragment.select(&selector) {
        if let Some(src) = img.value().attr("src") {
            if !sources.iter().any(|s| s == src) {
                sources.push(src.to_string());
            }
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_passes_through() {
        let body = "<p>Hello <b>world</b></p>";
        assert_eq!(render_body(body, "html"), body);
    }

    #[test]
    fn test_markdown_renders_text() {
        let rendered = render_body("<p>Hello <b>world</b></p>", "md");
        assert!(rendered.contains("Hello"));
        assert!(rendered.contains("world"));
        assert!(!rendered.contains("<p>"));
    }

    #[test]
    fn test_image_sources_in_document_order() {
        let body = r#"<p><img src="http://a.example/1.png"> text
            <img alt="no src"> <img src="/relative/2.jpg"></p>"#;

        assert_eq!(
            find_image_sources(body),
            vec!["http://a.example/1.png".to_string(), "/relative/2.jpg".to_string()]
        );
    }

    #[test]
    fn test_repeated_source_reported_once() {
        let body = r#"<img src="/a.png"><img src="/a.png"><img src="/b.png">"#;
        assert_eq!(
            find_image_sources(body),
            vec!["/a.png".to_string(), "/b.png".to_string()]
        );
    }

    #[test]
    fn test_no_images() {
        assert!(find_image_sources("<p>plain</p>").is_empty());
    }
}
