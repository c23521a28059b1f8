//! Schema module - Configuration and persisted document types.

mod config;
mod document;

pub use config::*;
pub use document::*;
