//! Local knowledge base of MCP specifications.
//!
//! Mirrors versioned specification and documentation files from the
//! upstream repositories and serves them back through a read-through cache:
//! - Registry (what to download, per protocol version)
//! - Fetch with retry (transport failures only)
//! - Manager (directory bootstrap, concurrent sync, cached reads)

mod error;
mod fetch;
mod files;
mod json;
mod manager;
mod manifest;
mod registry;

pub use error::KnowledgeError;
pub use fetch::*;
pub use files::*;
pub use json::*;
pub use manager::*;
pub use manifest::VersionManifest;
pub use registry::*;
