//! Filesystem helpers for the knowledge base tree.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tokio::io::AsyncWriteExt;

use super::error::KnowledgeError;

/// A single path component: no separators, no leading dot.
static SAFE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]*$").expect("valid regex"));

/// Whether `segment` can be joined onto a directory without escaping it.
#[must_use]
pub fn is_safe_path_segment(segment: &str) -> bool {
    SAFE_SEGMENT.is_match(segment)
}

/// Create the parent directory of `file_path`, and any missing ancestors.
///
/// Succeeds if the directory already exists.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub async fn ensure_parent_directory_exists(file_path: &Path) -> std::io::Result<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

/// Write `contents` to `path` atomically (temp file + sync + rename).
///
/// Readers see either the previous file or the complete new one. Each call
/// writes through its own uniquely named temp file, so concurrent writers to
/// the same path never share one.
///
/// # Errors
///
/// Returns `KnowledgeError::Write` if any step fails.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), KnowledgeError> {
    let wrap = |source| KnowledgeError::Write {
        path: path.to_path_buf(),
        source,
    };

    ensure_parent_directory_exists(path).await.map_err(wrap)?;

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    let temp_path = path.with_file_name(temp_name);

    let mut file = tokio::fs::File::create(&temp_path).await.map_err(wrap)?;
    file.write_all(contents).await.map_err(wrap)?;
    file.sync_data().await.map_err(wrap)?;
    drop(file);

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(wrap(e));
    }
    Ok(())
}
