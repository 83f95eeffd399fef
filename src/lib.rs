//! wp2jekyll - WordPress exports to Jekyll-style site trees
//!
//! Converts WordPress WXR XML exports into per-item files with YAML front
//! matter, rewriting each body into the target text format and optionally
//! downloading referenced images to local copies.
//!
//! # Architecture
//!
//! A single-pass, strictly sequential pipeline per export file:
//! - Parse the WXR document into domain records
//! - Assign each item a unique, filesystem-safe identifier
//! - Resolve its destination path (posts flat, pages mirroring hierarchy)
//! - Optionally localize images and rewrite body references
//! - Write front matter plus the converted body
//!
//! # Modules
//!
//! - `ingest`: WXR parsing (quick-xml)
//! - `domain`: Data structures (Item, ExportDocument)
//! - `convert`: Body markup conversion and image scanning
//! - `export`: Uid/path/asset resolution and the run orchestrator
//! - `fetch`: Remote image retrieval
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Convert everything under wp_exports_dir
//! wp2jekyll convert
//!
//! # Also download and localize images
//! wp2jekyll convert --download-images
//!
//! # Inspect the resolved configuration
//! wp2jekyll config
//! ```

pub mod cli;
pub mod config;
pub mod convert;
pub mod domain;
pub mod export;
pub mod fetch;
pub mod ingest;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use domain::{ChannelHeader, ExportDocument, Item, ItemType};
pub use export::{AttachmentTable, ExportStats, Exporter, Layout, PathResolver, UidTable};
pub use fetch::{HttpFetcher, ImageFetcher};
pub use ingest::{WxrError, WxrParser};
