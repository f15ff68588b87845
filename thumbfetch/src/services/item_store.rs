//! One-file-per-item JSON store
//!
//! Two namespaces, completed and failed, each a directory holding `<shortcode>.json`.
//! Writes go to a hidden temp file first and are renamed into place, so a reader
//! never sees a half-written record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use thumbfetch_common::FetchConfig;

use crate::models::PostItem;

const RECORD_EXTENSION: &str = "json";

/// Item store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record not found: {0}")]
    NotFound(PathBuf),

    /// Id would escape the namespace directory
    #[error("Invalid item id: {0:?}")]
    InvalidId(String),
}

/// Which partition a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Completed,
    Failed,
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Filesystem-backed store for completed and failed records
#[derive(Debug, Clone)]
pub struct ItemStore {
    completed_dir: PathBuf,
    failed_dir: PathBuf,
}

impl ItemStore {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            completed_dir: config.data_dir.clone(),
            failed_dir: config.error_dir.clone(),
        }
    }

    pub fn dir(&self, namespace: Namespace) -> &Path {
        match namespace {
            Namespace::Completed => &self.completed_dir,
            Namespace::Failed => &self.failed_dir,
        }
    }

    /// Path of the record for `id` in `namespace`
    pub fn path(&self, namespace: Namespace, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self
            .dir(namespace)
            .join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    /// Create both namespace directories (idempotent)
    pub async fn ensure_dirs(&self) -> Result<(), StoreError> {
        for dir in [&self.completed_dir, &self.failed_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| StoreError::Io {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn exists(&self, namespace: Namespace, id: &str) -> bool {
        match self.path(namespace, id) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Best-effort write: returns the written path, or logs and returns `None`
    pub async fn write(&self, namespace: Namespace, id: &str, record: &PostItem) -> Option<PathBuf> {
        match self.try_write(namespace, id, record).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(
                    namespace = %namespace,
                    shortcode = %id,
                    error = %e,
                    "Failed to save record"
                );
                None
            }
        }
    }

    async fn try_write(
        &self,
        namespace: Namespace,
        id: &str,
        record: &PostItem,
    ) -> Result<PathBuf, StoreError> {
        let path = self.path(namespace, id)?;
        let content = serde_json::to_vec_pretty(record).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        let tmp_path = self.dir(namespace).join(format!(".{}.{}.tmp", id, RECORD_EXTENSION));
        tokio::fs::write(&tmp_path, &content)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io { path, source });
        }

        tracing::debug!(namespace = %namespace, shortcode = %id, "Record saved");
        Ok(path)
    }

    /// Load a stored record
    pub async fn read(&self, namespace: Namespace, id: &str) -> Result<PostItem, StoreError> {
        let path = self.path(namespace, id)?;
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(path)),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&content).map_err(|source| StoreError::Json { path, source })
    }

    /// Delete a record; an absent file is an error
    pub async fn remove(&self, namespace: Namespace, id: &str) -> Result<(), StoreError> {
        let path = self.path(namespace, id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(path)),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Ids of all records in `namespace`, sorted
    pub async fn list(&self, namespace: Namespace) -> Result<Vec<String>, StoreError> {
        let dir = self.dir(namespace);
        let io_err = |source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}
