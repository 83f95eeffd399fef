//! Run configuration.
//!
//! All knobs live in one YAML file (`config.yaml` by default) and are loaded
//! into an explicit [`Config`] value that is threaded through the parser and
//! exporter constructors. Every field has a default so a minimal file works.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::export::Layout;

/// Converter configuration (matches the YAML file schema)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory scanned for `*.xml` export files
    #[serde(default = "default_exports_dir")]
    pub wp_exports_dir: String,

    /// Root of the output tree
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Download referenced images and rewrite body links to local copies
    #[serde(default)]
    pub download_images: bool,

    /// Store assets under per-item directories instead of a flat `assets/`
    #[serde(default = "default_true")]
    pub use_hierarchical_folders: bool,

    /// Re-download assets that already exist on disk
    #[serde(default)]
    pub replace_existing: bool,

    /// Output format, also used as the file extension (`md`, `markdown`,
    /// `html`)
    #[serde(default = "default_target_format")]
    pub target_format: String,

    /// Taxonomy handling rules
    #[serde(default)]
    pub taxonomies: TaxonomyRules,

    /// Item types to drop without comment (e.g. `attachment`,
    /// `nav_menu_item`)
    #[serde(default)]
    pub item_type_filter: HashSet<String>,

    /// Field name -> value; items where any listed field matches are skipped
    #[serde(default)]
    pub item_field_filter: HashMap<String, String>,

    /// chrono format string for `wp:post_date_gmt` values
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Regex -> replacement rules applied to raw bodies at parse time
    #[serde(default)]
    pub body_replace: BTreeMap<String, String>,
}

/// Taxonomy filtering and renaming rules
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyRules {
    /// Taxonomy domains to drop entirely (e.g. `post_format`)
    #[serde(default)]
    pub filter: HashSet<String>,

    /// Domain -> term value; drops that one term from that one domain
    #[serde(default)]
    pub entry_filter: HashMap<String, String>,

    /// Domain -> display name used in front matter (e.g. `category` ->
    /// `categories`)
    #[serde(default)]
    pub name_mapping: HashMap<String, String>,
}

fn default_exports_dir() -> String {
    "wordpress-xml".to_string()
}
fn default_build_dir() -> String {
    "build".to_string()
}
fn default_target_format() -> String {
    "md".to_string()
}
fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wp_exports_dir: default_exports_dir(),
            build_dir: default_build_dir(),
            download_images: false,
            use_hierarchical_folders: true,
            replace_existing: false,
            target_format: default_target_format(),
            taxonomies: TaxonomyRules::default(),
            item_type_filter: HashSet::new(),
            item_field_filter: HashMap::new(),
            date_format: default_date_format(),
            body_replace: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Build output root as a path
    pub fn build_dir(&self) -> PathBuf {
        PathBuf::from(&self.build_dir)
    }

    /// Asset layout policy implied by `use_hierarchical_folders`
    pub fn layout(&self) -> Layout {
        if self.use_hierarchical_folders {
            Layout::Hierarchical
        } else {
            Layout::Flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("build_dir: out").unwrap();

        assert_eq!(config.build_dir, "out");
        assert_eq!(config.wp_exports_dir, "wordpress-xml");
        assert_eq!(config.target_format, "md");
        assert_eq!(config.date_format, "%Y-%m-%d %H:%M:%S");
        assert!(config.use_hierarchical_folders);
        assert!(!config.download_images);
        assert_eq!(config.layout(), Layout::Hierarchical);
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
wp_exports_dir: exports
build_dir: build
download_images: true
use_hierarchical_folders: false
target_format: html
taxonomies:
  filter:
    - post_format
  entry_filter:
    category: Uncategorized
  name_mapping:
    category: categories
    post_tag: tags
item_type_filter:
  - attachment
item_field_filter:
  status: draft
body_replace:
  "\\[caption[^\\]]*\\]": ""
"#
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert!(config.download_images);
        assert_eq!(config.layout(), Layout::Flat);
        assert_eq!(config.target_format, "html");
        assert!(config.taxonomies.filter.contains("post_format"));
        assert_eq!(
            config.taxonomies.entry_filter.get("category"),
            Some(&"Uncategorized".to_string())
        );
        assert_eq!(
            config.taxonomies.name_mapping.get("post_tag"),
            Some(&"tags".to_string())
        );
        assert!(config.item_type_filter.contains("attachment"));
        assert_eq!(config.item_field_filter.get("status"), Some(&"draft".to_string()));
        assert_eq!(config.body_replace.len(), 1);
    }

    #[test]
    fn test_missing_config_file_errors() {
        assert!(Config::load(Path::new("/no/such/config.yaml")).is_err());
    }
}
