//! Export pipeline: identifier assignment, path resolution, and writing.
//!
//! This module contains:
//! - UidTable: unique output identifiers per namespace
//! - PathResolver: per-item destination paths (posts flat, pages nested)
//! - AttachmentTable: local asset paths with per-owner disambiguation
//! - Exporter: the sequential run orchestrator

pub mod assets;
pub mod paths;
pub mod uid;
pub mod writer;

// Re-export commonly used types
pub use assets::{relative_reference, AttachmentTable, Layout};
pub use paths::{blog_root, PathResolver, PAGE_NAMESPACE};
pub use uid::UidTable;
pub use writer::{ExportStats, Exporter};
