//! Export file ingestion.
//!
//! Streaming WXR (WordPress eXtended RSS) parsing into domain records.

pub mod wxr;

pub use wxr::{WxrError, WxrParser};
