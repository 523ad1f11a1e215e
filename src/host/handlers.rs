//! HTTP handlers for the knowledge base API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use super::api::{ContentResponse, VersionsResponse};
use crate::knowledge::{KnowledgeBaseManager, SyncReport, VersionManifest};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The knowledge base being served.
    pub knowledge: Arc<KnowledgeBaseManager>,
}

impl AppState {
    #[must_use]
    pub fn new(knowledge: Arc<KnowledgeBaseManager>) -> Self {
        Self { knowledge }
    }
}

/// GET /api/versions - Known protocol versions.
pub async fn get_versions(State(state): State<AppState>) -> Json<VersionsResponse> {
    Json(VersionsResponse {
        versions: state.knowledge.available_versions().to_vec(),
        latest_version: state.knowledge.get_latest_protocol_version().to_string(),
    })
}

/// GET /api/spec - Specification for the latest version.
pub async fn get_latest_spec(State(state): State<AppState>) -> Json<ContentResponse> {
    Json(specification_response(&state.knowledge, None).await)
}

/// GET /api/spec/:version - Specification for a given version.
pub async fn get_spec(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> Json<ContentResponse> {
    Json(specification_response(&state.knowledge, Some(&version)).await)
}

async fn specification_response(
    knowledge: &KnowledgeBaseManager,
    version: Option<&str>,
) -> ContentResponse {
    let version = version.unwrap_or_else(|| knowledge.get_latest_protocol_version());

    if !knowledge.registry().is_known_version(version) {
        return ContentResponse::error(format!(
            "Invalid version. Available versions are: {}",
            knowledge.available_versions().join(", ")
        ));
    }

    match knowledge.get_specification(Some(version)).await {
        Some(spec) => match serde_json::to_string_pretty(&*spec) {
            Ok(text) => ContentResponse::text(text),
            Err(e) => ContentResponse::error(format!("Failed to serialize specification: {e}")),
        },
        None => ContentResponse::text(format!("Specification not found for version {version}.")),
    }
}

/// GET /api/docs - The default usage guide.
pub async fn get_default_docs(State(state): State<AppState>) -> Json<ContentResponse> {
    Json(documentation_response(&state.knowledge, None).await)
}

/// GET /api/docs/:topic - Documentation for a topic, or the default guide.
pub async fn get_docs(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> Json<ContentResponse> {
    Json(documentation_response(&state.knowledge, Some(&topic)).await)
}

async fn documentation_response(
    knowledge: &KnowledgeBaseManager,
    topic: Option<&str>,
) -> ContentResponse {
    match knowledge.get_documentation(topic).await {
        Some(text) => ContentResponse::text(text),
        None => ContentResponse::text("Documentation not found."),
    }
}

/// POST /api/sync - Re-sync every file and report the outcome.
pub async fn post_sync(State(state): State<AppState>) -> Json<SyncReport> {
    Json(state.knowledge.sync_latest_specifications().await)
}

/// GET /api/status - Manifest of the most recent sync, or null.
pub async fn get_status(State(state): State<AppState>) -> Json<Option<VersionManifest>> {
    Json(state.knowledge.read_manifest().await)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::knowledge::Registry;

    fn state(temp_dir: &TempDir) -> AppState {
        let registry = Registry::new(
            vec!["v1".to_string(), "v2".to_string()],
            "v2",
            Vec::new(),
        );
        let manager = KnowledgeBaseManager::new(temp_dir.path())
            .with_registry(registry)
            .unwrap();
        AppState::new(Arc::new(manager))
    }

    fn write(temp_dir: &TempDir, relative: &str, content: &str) {
        let path = temp_dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_get_versions() {
        let temp_dir = TempDir::new().unwrap();
        let Json(response) = get_versions(State(state(&temp_dir))).await;

        assert_eq!(response.versions, vec!["v1", "v2"]);
        assert_eq!(response.latest_version, "v2");
    }

    #[tokio::test]
    async fn test_get_spec_found() {
        let temp_dir = TempDir::new().unwrap();
        write(&temp_dir, "specifications/v1/schema.json", r#"{"foo":"bar"}"#);

        let Json(response) = get_spec(State(state(&temp_dir)), Path("v1".to_string())).await;

        assert!(!response.is_error);
        let body: serde_json::Value = serde_json::from_str(response.first_text()).unwrap();
        assert_eq!(body, serde_json::json!({"foo": "bar", "version": "v1"}));
    }

    #[tokio::test]
    async fn test_get_latest_spec_not_found_is_text() {
        let temp_dir = TempDir::new().unwrap();

        let Json(response) = get_latest_spec(State(state(&temp_dir))).await;

        assert!(!response.is_error);
        assert_eq!(response.first_text(), "Specification not found for version v2.");
    }

    #[tokio::test]
    async fn test_get_spec_unknown_version() {
        let temp_dir = TempDir::new().unwrap();

        let Json(response) = get_spec(State(state(&temp_dir)), Path("v9".to_string())).await;

        assert!(response.is_error);
        assert_eq!(
            response.first_text(),
            "Invalid version. Available versions are: v1, v2"
        );
    }

    #[tokio::test]
    async fn test_get_docs_falls_back_to_guide() {
        let temp_dir = TempDir::new().unwrap();
        write(&temp_dir, "documentation/usage-guide.md", "# Guide");

        let Json(response) = get_docs(State(state(&temp_dir)), Path("nope".to_string())).await;

        assert_eq!(response.first_text(), "# Guide");
    }

    #[tokio::test]
    async fn test_get_default_docs_missing() {
        let temp_dir = TempDir::new().unwrap();

        let Json(response) = get_default_docs(State(state(&temp_dir))).await;

        assert_eq!(response.first_text(), "Documentation not found.");
    }

    #[tokio::test]
    async fn test_post_sync_then_status() {
        let temp_dir = TempDir::new().unwrap();
        let state = state(&temp_dir);

        let Json(report) = post_sync(State(state.clone())).await;
        assert!(report.success);

        let Json(manifest) = get_status(State(state)).await;
        let manifest = manifest.unwrap();
        assert_eq!(manifest.latest_version, "v2");
        assert!(manifest.sync_results.is_empty());
    }
}
