//! mcpguide - Local knowledge base of MCP specifications.

pub mod config;
pub mod display;
pub mod host;
pub mod knowledge;
