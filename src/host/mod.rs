//! HTTP host surface mapping versioned resource requests onto the knowledge base.

mod api;
mod error;
mod handlers;
mod server;

pub use api::{ContentResponse, TextContent, VersionsResponse};
pub use error::ServerError;
pub use handlers::AppState;
pub use server::SpecServer;
