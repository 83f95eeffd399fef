//! Domain types for the converter.
//!
//! This module contains the core data structures:
//! - Item: one content unit from the export
//! - ChannelHeader: blog-level metadata
//! - ExportDocument: a fully parsed export file

pub mod item;

// Re-export commonly used types
pub use item::{ChannelHeader, ExportDocument, Item, ItemType};
