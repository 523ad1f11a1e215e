//! Declarative description of the remote sources the knowledge base mirrors.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::KnowledgeError;

/// Placeholder substituted with a protocol version in remote and local paths.
pub const VERSION_TOKEN: &str = "{version}";

/// Protocol version served when a caller does not ask for one.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-03-26";

/// Every protocol version the knowledge base mirrors.
pub const AVAILABLE_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26"];

/// SDK implementations that get their own directory under `implementations/`.
pub const SDK_NAMES: &[&str] = &["typescript-sdk", "python-sdk"];

/// One fetchable artifact of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    /// Suffix appended to the repository URL. May contain [`VERSION_TOKEN`].
    pub remote_path: String,
    /// Path relative to the knowledge base root. May contain [`VERSION_TOKEN`].
    pub local_path: String,
    /// Whether failing to obtain this file fails the sync.
    pub required: bool,
}

impl FileSpec {
    /// Create a file spec.
    #[must_use]
    pub fn new(remote_path: impl Into<String>, local_path: impl Into<String>, required: bool) -> Self {
        Self {
            remote_path: remote_path.into(),
            local_path: local_path.into(),
            required,
        }
    }
}

/// A named remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Identifier of the repository.
    pub name: String,
    /// Base URL, without a trailing slash.
    pub url: String,
    /// Files fetched from this repository, in order.
    pub files: Vec<FileSpec>,
}

impl RepositoryInfo {
    /// Create a repository description.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>, files: Vec<FileSpec>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            files,
        }
    }
}

/// A single download resolved for a concrete protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Repository the file comes from.
    pub repository: String,
    /// Full remote URL (`{url}{remote_path}`).
    pub url: String,
    /// Local path relative to the knowledge base root.
    pub local_path: String,
    /// Whether failure fails the sync.
    pub required: bool,
}

/// The set of versions and repositories the knowledge base is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    versions: Vec<String>,
    latest_version: String,
    sdk_names: Vec<String>,
    repositories: Vec<RepositoryInfo>,
}

impl Registry {
    /// Build a registry from explicit parts.
    #[must_use]
    pub fn new(
        versions: Vec<String>,
        latest_version: impl Into<String>,
        repositories: Vec<RepositoryInfo>,
    ) -> Self {
        Self {
            versions,
            latest_version: latest_version.into(),
            sdk_names: Vec::new(),
            repositories,
        }
    }

    /// Set the SDK names used for directory bootstrap (builder pattern).
    #[must_use]
    pub fn with_sdk_names(mut self, sdk_names: Vec<String>) -> Self {
        self.sdk_names = sdk_names;
        self
    }

    /// All known protocol versions.
    #[must_use]
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// The designated latest protocol version.
    #[must_use]
    pub fn latest_version(&self) -> &str {
        &self.latest_version
    }

    /// SDK names with a directory under `implementations/`.
    #[must_use]
    pub fn sdk_names(&self) -> &[String] {
        &self.sdk_names
    }

    /// Configured repositories.
    #[must_use]
    pub fn repositories(&self) -> &[RepositoryInfo] {
        &self.repositories
    }

    /// Whether `version` is one of the known protocol versions.
    #[must_use]
    pub fn is_known_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    /// Check the registry for configuration mistakes.
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeError::InvalidRegistry` when there are no versions,
    /// the latest version is not a known version, or a repository URL does
    /// not parse or ends with a slash.
    pub fn validate(&self) -> Result<(), KnowledgeError> {
        if self.versions.is_empty() {
            return Err(KnowledgeError::InvalidRegistry(
                "no protocol versions configured".to_string(),
            ));
        }
        if !self.is_known_version(&self.latest_version) {
            return Err(KnowledgeError::InvalidRegistry(format!(
                "latest version {} is not a known version",
                self.latest_version
            )));
        }
        for repo in &self.repositories {
            url::Url::parse(&repo.url).map_err(|e| {
                KnowledgeError::InvalidRegistry(format!("repository {}: {e}", repo.name))
            })?;
            if repo.url.ends_with('/') {
                return Err(KnowledgeError::InvalidRegistry(format!(
                    "repository {} URL must not end with '/'",
                    repo.name
                )));
            }
        }
        Ok(())
    }

    /// Build the full download plan: every version crossed with every file.
    ///
    /// Files without a version token resolve to the same local path for every
    /// version and are planned only once.
    #[must_use]
    pub fn download_plan(&self) -> Vec<PlannedFile> {
        let mut seen = HashSet::new();
        let mut plan = Vec::new();

        for version in &self.versions {
            for repo in &self.repositories {
                for file in &repo.files {
                    let local_path = file.local_path.replace(VERSION_TOKEN, version);
                    if !seen.insert(local_path.clone()) {
                        continue;
                    }
                    plan.push(PlannedFile {
                        repository: repo.name.clone(),
                        url: format!(
                            "{}{}",
                            repo.url,
                            file.remote_path.replace(VERSION_TOKEN, version)
                        ),
                        local_path,
                        required: file.required,
                    });
                }
            }
        }

        plan
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            versions: AVAILABLE_VERSIONS.iter().map(|v| (*v).to_string()).collect(),
            latest_version: LATEST_PROTOCOL_VERSION.to_string(),
            sdk_names: SDK_NAMES.iter().map(|s| (*s).to_string()).collect(),
            repositories: default_repositories(),
        }
    }
}

/// The upstream MCP repositories.
#[must_use]
pub fn default_repositories() -> Vec<RepositoryInfo> {
    vec![
        RepositoryInfo::new(
            "specification",
            "https://raw.githubusercontent.com/modelcontextprotocol/modelcontextprotocol",
            vec![
                FileSpec::new(
                    "/main/schema/{version}/schema.json",
                    "specifications/{version}/schema.json",
                    true,
                ),
                FileSpec::new(
                    "/main/schema/examples/resource-response.json",
                    "examples/resource-response.json",
                    false,
                ),
            ],
        ),
        RepositoryInfo::new(
            "typescript-sdk",
            "https://raw.githubusercontent.com/modelcontextprotocol/typescript-sdk",
            vec![FileSpec::new(
                "/main/README.md",
                "implementations/typescript-sdk/README.md",
                true,
            )],
        ),
        RepositoryInfo::new(
            "python-sdk",
            "https://raw.githubusercontent.com/modelcontextprotocol/python-sdk",
            vec![FileSpec::new(
                "/main/README.md",
                "implementations/python-sdk/README.md",
                true,
            )],
        ),
        RepositoryInfo::new(
            "documentation",
            "https://raw.githubusercontent.com/modelcontextprotocol/docs",
            vec![FileSpec::new(
                "/main/usage-guide.md",
                "documentation/usage-guide.md",
                true,
            )],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_repo() -> Registry {
        Registry::new(
            vec!["v1".to_string(), "v2".to_string()],
            "v2",
            vec![RepositoryInfo::new(
                "spec",
                "http://example.test",
                vec![
                    FileSpec::new("/{version}/schema.json", "specifications/{version}/schema.json", true),
                    FileSpec::new("/README.md", "documentation/readme.md", false),
                ],
            )],
        )
    }

    #[test]
    fn test_default_registry_is_valid() {
        let registry = Registry::default();
        assert!(registry.validate().is_ok());
        assert_eq!(registry.latest_version(), LATEST_PROTOCOL_VERSION);
        assert_eq!(registry.sdk_names().len(), 2);
    }

    #[test]
    fn test_download_plan_substitutes_version() {
        let plan = single_repo().download_plan();

        let schemas: Vec<_> = plan
            .iter()
            .filter(|p| p.local_path.ends_with("schema.json"))
            .collect();
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0].url, "http://example.test/v1/schema.json");
        assert_eq!(schemas[0].local_path, "specifications/v1/schema.json");
        assert_eq!(schemas[1].local_path, "specifications/v2/schema.json");
    }

    #[test]
    fn test_download_plan_dedupes_version_independent_files() {
        let plan = single_repo().download_plan();
        let readmes = plan
            .iter()
            .filter(|p| p.local_path == "documentation/readme.md")
            .count();
        assert_eq!(readmes, 1);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_default_plan_has_schema_per_version() {
        let plan = Registry::default().download_plan();
        for version in AVAILABLE_VERSIONS {
            let expected = format!("specifications/{version}/schema.json");
            assert!(plan.iter().any(|p| p.local_path == expected && p.required));
        }
    }

    #[test]
    fn test_validate_rejects_unknown_latest() {
        let registry = Registry::new(vec!["v1".to_string()], "v9", Vec::new());
        assert!(matches!(
            registry.validate(),
            Err(KnowledgeError::InvalidRegistry(_))
        ));
    }

    #[test]
    fn test_validate_rejects_trailing_slash() {
        let registry = Registry::new(
            vec!["v1".to_string()],
            "v1",
            vec![RepositoryInfo::new("r", "http://example.test/", Vec::new())],
        );
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_versions() {
        let registry = Registry::new(Vec::new(), "v1", Vec::new());
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_is_known_version() {
        let registry = single_repo();
        assert!(registry.is_known_version("v1"));
        assert!(!registry.is_known_version("v3"));
    }
}
