//! Local filesystem connector.
//!
//! Config shape: `{"path": "/absolute/base/dir"}`. File ids are absolute
//! paths under the base directory.
//!
//! Every resolved path is canonicalized before the containment check, so
//! `..` segments and symlinks cannot read outside the configured base.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ragspace_core::{ConnectError, Connector, FileKind, FileObject};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Connector over a local directory tree.
pub struct FilesystemConnector;

impl FilesystemConnector {
    /// Create a new filesystem connector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Pull the base path out of a stored config.
    fn base_path(config: &Value) -> Result<PathBuf, ConnectError> {
        config
            .get("path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                ConnectError::InvalidConfig("missing \"path\" in filesystem config".to_string())
            })
    }

    /// Canonicalize `target` and verify it stays under the canonicalized
    /// base. Rejects escapes via `..` segments and symlinks.
    async fn resolve_sandboxed(base: &Path, target: &Path) -> Result<PathBuf, ConnectError> {
        let canonical_base = fs::canonicalize(base).await.map_err(|e| {
            ConnectError::InvalidConfig(format!(
                "base path {} not accessible: {e}",
                base.display()
            ))
        })?;

        let canonical_target = fs::canonicalize(target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConnectError::NotFound(target.display().to_string())
            } else {
                ConnectError::Io(e)
            }
        })?;

        if !canonical_target.starts_with(&canonical_base) {
            return Err(ConnectError::AccessDenied(format!(
                "{} resolves outside {}",
                target.display(),
                canonical_base.display()
            )));
        }

        Ok(canonical_target)
    }
}

impl Default for FilesystemConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for FilesystemConnector {
    fn kind(&self) -> &str {
        "filesystem"
    }

    async fn validate_config(&self, config: &Value) -> Result<bool, ConnectError> {
        let base = match Self::base_path(config) {
            Ok(base) => base,
            Err(_) => return Ok(false),
        };

        match fs::metadata(&base).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(_) => Ok(false),
        }
    }

    async fn list_files(
        &self,
        config: &Value,
        sub_path: Option<&str>,
    ) -> Result<Vec<FileObject>, ConnectError> {
        let base = Self::base_path(config)?;
        let target = match sub_path {
            Some(sub) => base.join(sub),
            None => base.clone(),
        };

        let target = Self::resolve_sandboxed(&base, &target).await?;

        let mut entries = match fs::read_dir(&target).await {
            Ok(entries) => entries,
            Err(e) => {
                // Unreadable directories yield an empty listing, not a failure
                warn!("cannot read directory {}: {e}", target.display());
                return Ok(Vec::new());
            }
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }

            let full_path = entry.path();
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("cannot stat {}: {e}", full_path.display());
                    continue;
                }
            };

            let kind = if meta.is_dir() {
                FileKind::Folder
            } else {
                FileKind::File
            };

            let mime_type = if kind == FileKind::File {
                Some(
                    mime_guess::from_path(&full_path)
                        .first_or_text_plain()
                        .to_string(),
                )
            } else {
                None
            };

            files.push(FileObject {
                id: full_path.to_string_lossy().to_string(),
                name,
                path: full_path.to_string_lossy().to_string(),
                kind,
                mime_type,
                size: (kind == FileKind::File).then(|| meta.len()),
                modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        Ok(files)
    }

    async fn get_file_content(
        &self,
        config: &Value,
        file_id: &str,
    ) -> Result<Vec<u8>, ConnectError> {
        let base = Self::base_path(config)?;
        let requested = Path::new(file_id);
        let target = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            base.join(requested)
        };

        let resolved = Self::resolve_sandboxed(&base, &target).await?;
        Ok(fs::read(&resolved).await?)
    }
}
