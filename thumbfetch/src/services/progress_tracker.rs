//! Resume-point tracking
//!
//! The checkpoint is an append-only log, one `<RFC3339 timestamp>\t<shortcode>` line
//! per completed item, in the order items completed. A log entry only counts while
//! its completed record still exists. When no entry qualifies (log absent or empty,
//! or the completed directory was cleared) the completed directory is scanned and
//! the most recently created record wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thumbfetch_common::FetchConfig;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub struct ProgressTracker {
    log_path: PathBuf,
    completed_dir: PathBuf,
    /// Serializes appends from concurrent workers
    append_lock: Mutex<()>,
}

impl ProgressTracker {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            log_path: config.progress_log.clone(),
            completed_dir: config.data_dir.clone(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Shortcode of the most recently completed item that still has a record, if any
    pub async fn last_completed_id(&self) -> Option<String> {
        if let Some(id) = self.last_logged_id().await {
            return Some(id);
        }

        let scanned = self.latest_created_record().await;
        if scanned.is_some() {
            tracing::debug!(
                log = %self.log_path.display(),
                "Progress log empty, resume point taken from completed directory"
            );
        }
        scanned
    }

    /// Append `id` to the progress log; failures are logged, never returned
    pub async fn record_completed(&self, id: &str) {
        let _guard = self.append_lock.lock().await;
        let line = format!("{}\t{}\n", chrono::Utc::now().to_rfc3339(), id);

        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(
                shortcode = %id,
                log = %self.log_path.display(),
                error = %e,
                "Failed to append to progress log"
            );
        }
    }

    async fn last_logged_id(&self) -> Option<String> {
        let content = match tokio::fs::read_to_string(&self.log_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    log = %self.log_path.display(),
                    error = %e,
                    "Cannot read progress log"
                );
                return None;
            }
        };

        let mut stale = 0usize;
        for id in content.lines().rev().filter_map(parse_entry) {
            if self.has_record(id).await {
                if stale > 0 {
                    tracing::debug!(stale, shortcode = %id, "Skipped log entries without a completed record");
                }
                return Some(id.to_string());
            }
            stale += 1;
        }

        if stale > 0 {
            tracing::info!(
                log = %self.log_path.display(),
                stale,
                "No progress log entry has a completed record, ignoring log"
            );
        }
        None
    }

    async fn has_record(&self, id: &str) -> bool {
        if id.contains(['/', '\\']) || id == "." || id == ".." {
            return false;
        }
        let path = self.completed_dir.join(format!("{}.json", id));
        tokio::fs::try_exists(&path).await.unwrap_or(false)
    }

    /// Stem of the completed record with the newest creation time
    ///
    /// Falls back to modification time where the platform has no creation time.
    async fn latest_created_record(&self) -> Option<String> {
        let mut entries = match tokio::fs::read_dir(&self.completed_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(
                    dir = %self.completed_dir.display(),
                    error = %e,
                    "Completed directory not readable"
                );
                return None;
            }
        };

        let mut latest: Option<(SystemTime, String)> = None;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let Ok(created) = metadata.created().or_else(|_| metadata.modified()) else {
                continue;
            };

            let candidate = (created, stem.to_string());
            if latest.as_ref().map_or(true, |current| candidate > *current) {
                latest = Some(candidate);
            }
        }

        latest.map(|(_, id)| id)
    }
}

/// Shortcode from one log line; blank lines yield `None`
fn parse_entry(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    line.rsplit('\t').next().filter(|id| !id.is_empty())
}
