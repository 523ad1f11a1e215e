//! Knowledge base manager: directory bootstrap, multi-file sync and the
//! cached read path.
//!
//! Public operations never return errors. Per-file and per-read failures are
//! logged and reported through [`SyncReport`] or an `Option`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::error::KnowledgeError;
use super::fetch::{fetch_with_retry, HttpTransport, ReqwestTransport, RetryPolicy};
use super::files::{ensure_parent_directory_exists, is_safe_path_segment, write_atomic};
use super::json::validate_json;
use super::manifest::VersionManifest;
use super::registry::{PlannedFile, Registry};
use crate::config::KnowledgeConfig;

/// Guide served when a documentation topic has no file of its own.
pub const DEFAULT_GUIDE: &str = "usage-guide.md";

/// Outcome of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// True iff no required file failed.
    pub success: bool,
    /// Local paths (relative to the root) of required files that failed.
    pub failed_files: Vec<String>,
}

/// A specification document with its `version` field injected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Specification(Map<String, Value>);

impl Specification {
    /// The version this document was served for.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.0.get("version").and_then(Value::as_str)
    }

    /// Look up a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The document as a JSON object.
    #[must_use]
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The document as an owned JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Owns the knowledge base root, the specification cache and the outcome
/// map of the most recent sync.
///
/// The cache is filled lazily on the first read of each version and never
/// invalidated. A later sync does not refresh it, so a cached document can
/// be older than the file now on disk until the process restarts.
pub struct KnowledgeBaseManager {
    base_path: PathBuf,
    registry: Registry,
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    max_concurrent_downloads: usize,
    cache: RwLock<HashMap<String, Arc<Specification>>>,
    sync_results: Mutex<HashMap<PathBuf, bool>>,
    sync_lock: Mutex<()>,
}

impl KnowledgeBaseManager {
    /// Create a manager rooted at `base_path` with the default registry and
    /// an HTTP transport. Relative paths are resolved against the current
    /// directory.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self {
            base_path: std::path::absolute(&base_path).unwrap_or(base_path),
            registry: Registry::default(),
            transport: Arc::new(ReqwestTransport::default()),
            retry: RetryPolicy::default(),
            max_concurrent_downloads: 0,
            cache: RwLock::new(HashMap::new()),
            sync_results: Mutex::new(HashMap::new()),
            sync_lock: Mutex::new(()),
        }
    }

    /// Create a manager from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeError::InvalidRegistry` if the registry fails
    /// validation.
    pub fn from_config(config: &KnowledgeConfig) -> Result<Self, KnowledgeError> {
        Ok(Self::new(config.base_path.clone())
            .with_registry(Registry::default())?
            .with_transport(Arc::new(ReqwestTransport::from_config(&config.fetch)))
            .with_retry_policy(config.fetch.retry_policy())
            .with_max_concurrent_downloads(config.fetch.max_concurrent_downloads))
    }

    /// Replace the registry (builder pattern).
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeError::InvalidRegistry` if `registry` fails
    /// [`Registry::validate`]. The manager is dropped in that case.
    pub fn with_registry(mut self, registry: Registry) -> Result<Self, KnowledgeError> {
        registry.validate()?;
        self.registry = registry;
        Ok(self)
    }

    /// Replace the HTTP transport (builder pattern).
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the retry policy (builder pattern).
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Cap concurrent downloads; 0 means unbounded (builder pattern).
    #[must_use]
    pub fn with_max_concurrent_downloads(mut self, limit: usize) -> Self {
        self.max_concurrent_downloads = limit;
        self
    }

    /// Absolute root of the knowledge base.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The registry this manager syncs from.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// All known protocol versions.
    #[must_use]
    pub fn available_versions(&self) -> &[String] {
        self.registry.versions()
    }

    /// The statically configured latest protocol version.
    #[must_use]
    pub fn get_latest_protocol_version(&self) -> &str {
        self.registry.latest_version()
    }

    /// Create the directory layout, then run the first sync.
    pub async fn initialize(&self) -> SyncReport {
        self.ensure_directories().await;
        self.sync_latest_specifications().await
    }

    async fn ensure_directories(&self) {
        let specs = self.base_path.join("specifications");
        let implementations = self.base_path.join("implementations");

        let mut dirs = vec![specs.clone()];
        dirs.extend(self.registry.versions().iter().map(|v| specs.join(v)));
        dirs.push(implementations.clone());
        dirs.extend(self.registry.sdk_names().iter().map(|s| implementations.join(s)));
        dirs.push(self.base_path.join("examples"));
        dirs.push(self.base_path.join("documentation"));

        for dir in dirs {
            if let Err(e) = tokio::fs::create_dir_all(&dir).await {
                tracing::error!(path = %dir.display(), error = %e, "Failed to create directory");
            }
        }
    }

    /// Download every planned file for every known version.
    pub async fn sync_latest_specifications(&self) -> SyncReport {
        self.sync_with_cancellation(CancellationToken::new()).await
    }

    /// Like [`Self::sync_latest_specifications`], but abortable.
    ///
    /// When `cancel` fires, downloads still in flight are aborted and
    /// recorded as failed. The manifest is written either way.
    ///
    /// Overlapping calls on one manager run one after another.
    pub async fn sync_with_cancellation(&self, cancel: CancellationToken) -> SyncReport {
        let _guard = self.sync_lock.lock().await;
        tracing::info!(base_path = %self.base_path.display(), "Syncing specifications for all versions");

        self.sync_results.lock().await.clear();
        let mut failed_files = Vec::new();

        let semaphore = (self.max_concurrent_downloads > 0)
            .then(|| Arc::new(Semaphore::new(self.max_concurrent_downloads)));
        let mut join_set = JoinSet::new();
        let mut pending = HashMap::new();

        for file in self.registry.download_plan() {
            let absolute = self.base_path.join(&file.local_path);
            let transport = Arc::clone(&self.transport);
            let retry = self.retry;
            let semaphore = semaphore.clone();
            let task_file = file.clone();
            let task_path = absolute.clone();

            let handle = join_set.spawn(async move {
                let _permit = match semaphore {
                    Some(s) => s.acquire_owned().await.ok(),
                    None => None,
                };
                download_file(transport.as_ref(), &task_file, &task_path, &retry).await
            });
            pending.insert(handle.id(), (file, absolute));
        }

        let mut cancelled = false;
        loop {
            let next = tokio::select! {
                () = cancel.cancelled(), if !cancelled => {
                    tracing::warn!(remaining = join_set.len(), "Sync cancelled, aborting downloads");
                    join_set.abort_all();
                    cancelled = true;
                    continue;
                }
                next = join_set.join_next_with_id() => next,
            };
            let Some(next) = next else { break };

            let (id, ok) = match next {
                Ok((id, ok)) => (id, ok),
                Err(e) => {
                    if !e.is_cancelled() {
                        tracing::error!(error = %e, "Download task failed");
                    }
                    (e.id(), false)
                }
            };
            let Some((file, absolute)) = pending.remove(&id) else {
                continue;
            };

            self.sync_results.lock().await.insert(absolute, ok);
            if !ok && file.required {
                failed_files.push(file.local_path);
            }
        }

        if let Err(e) = self.write_manifest().await {
            tracing::error!(error = %e, "Failed to write version manifest");
            failed_files.push(VersionManifest::RELATIVE_PATH.to_string());
        }

        failed_files.sort();
        let success = failed_files.is_empty();
        if success {
            tracing::info!("Specifications sync completed successfully");
        } else {
            tracing::error!(failed = ?failed_files, "Specifications sync completed with errors");
        }

        SyncReport {
            success,
            failed_files,
        }
    }

    async fn write_manifest(&self) -> Result<(), KnowledgeError> {
        let sync_results = self
            .sync_results
            .lock()
            .await
            .iter()
            .map(|(path, ok)| (path.to_string_lossy().into_owned(), *ok))
            .collect();

        let manifest = VersionManifest {
            versions: self.registry.versions().to_vec(),
            latest_version: self.registry.latest_version().to_string(),
            last_updated: chrono::Utc::now(),
            sync_results,
        };
        manifest
            .save(&self.base_path.join(VersionManifest::RELATIVE_PATH))
            .await
    }

    /// Snapshot of the outcome map from the most recent sync.
    pub async fn sync_results(&self) -> HashMap<PathBuf, bool> {
        self.sync_results.lock().await.clone()
    }

    /// The manifest written by the most recent sync, if readable.
    pub async fn read_manifest(&self) -> Option<VersionManifest> {
        let path = self.base_path.join(VersionManifest::RELATIVE_PATH);
        match VersionManifest::load(&path).await {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No readable manifest");
                None
            }
        }
    }

    /// Get the specification for `version`, or the latest version.
    ///
    /// Returns `None` when the document is missing or invalid.
    pub async fn get_specification(&self, version: Option<&str>) -> Option<Arc<Specification>> {
        let version = version
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.registry.latest_version());
        let cache_key = format!("spec-{version}");

        if let Some(spec) = self.cache.read().await.get(&cache_key) {
            return Some(Arc::clone(spec));
        }

        match self.load_specification(version).await {
            Ok(spec) => {
                let mut cache = self.cache.write().await;
                let entry = cache.entry(cache_key).or_insert_with(|| Arc::new(spec));
                Some(Arc::clone(entry))
            }
            Err(e) if e.is_not_found() => {
                tracing::error!(version = %version, "Schema file not found");
                None
            }
            Err(e) => {
                tracing::error!(version = %version, error = %e, "Error reading specification");
                None
            }
        }
    }

    fn specification_path(&self, version: &str) -> PathBuf {
        self.base_path
            .join("specifications")
            .join(version)
            .join("schema.json")
    }

    async fn load_specification(&self, version: &str) -> Result<Specification, KnowledgeError> {
        let path = self.specification_path(version);
        if !is_safe_path_segment(version) {
            return Err(KnowledgeError::NotFound { path });
        }

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KnowledgeError::NotFound { path: path.clone() }
            } else {
                KnowledgeError::Io(e)
            }
        })?;

        let validation = validate_json(&content);
        if !validation.valid {
            return Err(KnowledgeError::InvalidJson {
                path,
                reason: validation.error.unwrap_or_default(),
            });
        }

        let Value::Object(mut document) = serde_json::from_str::<Value>(&content)? else {
            return Err(KnowledgeError::NotAnObject { path });
        };
        document.insert("version".to_string(), Value::String(version.to_string()));
        Ok(Specification(document))
    }

    /// Read `documentation/{topic}.md`, falling back to the default guide.
    ///
    /// Returns `None` when neither file can be read.
    pub async fn get_documentation(&self, topic: Option<&str>) -> Option<String> {
        let docs = self.base_path.join("documentation");

        if let Some(topic) = topic {
            if is_safe_path_segment(topic) {
                let path = docs.join(format!("{topic}.md"));
                match tokio::fs::read_to_string(&path).await {
                    Ok(content) => return Some(content),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        tracing::debug!(topic = %topic, "No topic document, using default guide");
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to read topic document");
                    }
                }
            } else {
                tracing::warn!(topic = %topic, "Ignoring invalid documentation topic");
            }
        }

        let fallback = docs.join(DEFAULT_GUIDE);
        match tokio::fs::read_to_string(&fallback).await {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::error!(path = %fallback.display(), error = %e, "Documentation not available");
                None
            }
        }
    }
}

/// Fetch one planned file and store it. Returns whether it was stored.
async fn download_file(
    transport: &dyn HttpTransport,
    file: &PlannedFile,
    absolute: &Path,
    retry: &RetryPolicy,
) -> bool {
    let report = |reason: &str| {
        if file.required {
            tracing::error!(url = %file.url, reason = %reason, "Failed to download required file");
        } else {
            tracing::warn!(url = %file.url, reason = %reason, "Failed to download optional file");
        }
    };

    if let Err(e) = ensure_parent_directory_exists(absolute).await {
        report(&e.to_string());
        return false;
    }

    let result = fetch_with_retry(transport, &file.url, retry).await;
    let data = match result.data {
        Some(data) if result.success && !data.is_empty() => data,
        _ => {
            report(result.message.as_deref().unwrap_or("empty response body"));
            return false;
        }
    };

    if file.local_path.ends_with(".json") {
        let validation = validate_json(&data);
        if !validation.valid {
            report(&format!(
                "invalid JSON: {}",
                validation.error.unwrap_or_default()
            ));
            return false;
        }
    }

    if let Err(e) = write_atomic(absolute, data.as_bytes()).await {
        report(&e.to_string());
        return false;
    }

    tracing::info!(path = %file.local_path, repository = %file.repository, "Downloaded file");
    true
}
