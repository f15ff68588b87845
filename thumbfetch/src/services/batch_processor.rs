//! Primary pass: enrich every post in an input batch
//!
//! # Architecture
//! - Resume strictly after the last completed shortcode (see [`resume_after`])
//! - Bounded pool via `futures::stream::buffer_unordered(batch_workers)`
//! - Each worker is a spawned task running the full per-item procedure:
//!   skip check → cache check → jitter → lookup → save
//! - Outcome lines are logged in completion order; a worker panic becomes a
//!   failed outcome for that item only

use futures::stream::{self, StreamExt};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use thumbfetch_common::FetchConfig;

use crate::models::{BatchReport, ItemOutcome, PostItem};
use crate::services::item_store::{ItemStore, Namespace};
use crate::services::lookup_client::{post_url, DisplayUrlLookup};
use crate::services::progress_tracker::ProgressTracker;

const PROGRESS_LOG_INTERVAL: usize = 10;

/// Input batch could not be loaded; aborts the run
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Cannot read input {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON input {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Drop everything up to and including `last_completed`
///
/// Returns how many items were dropped and the remaining items. When
/// `last_completed` does not occur in the batch the whole batch is kept.
pub fn resume_after(
    mut items: Vec<PostItem>,
    last_completed: Option<&str>,
) -> (usize, Vec<PostItem>) {
    let Some(last) = last_completed else {
        return (0, items);
    };

    match items.iter().position(|p| p.shortcode() == Some(last)) {
        Some(index) => {
            let remaining = items.split_off(index + 1);
            (items.len(), remaining)
        }
        None => {
            tracing::warn!(
                shortcode = %last,
                "Last completed shortcode not in this batch, processing the full batch"
            );
            (0, items)
        }
    }
}

/// Read a JSON array of post records, preserving order
pub async fn load_items(path: &Path) -> Result<Vec<PostItem>, BatchError> {
    let content = tokio::fs::read(path).await.map_err(|source| BatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&content).map_err(|source| BatchError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Clone)]
pub struct BatchProcessor {
    lookup: Arc<dyn DisplayUrlLookup>,
    store: Arc<ItemStore>,
    progress: Arc<ProgressTracker>,
    workers: usize,
    jitter_min_ms: u64,
    jitter_max_ms: u64,
}

impl BatchProcessor {
    pub fn new(
        config: &FetchConfig,
        lookup: Arc<dyn DisplayUrlLookup>,
        store: Arc<ItemStore>,
        progress: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            lookup,
            store,
            progress,
            workers: config.batch_workers.max(1),
            jitter_min_ms: config.jitter_min_ms,
            jitter_max_ms: config.jitter_max_ms,
        }
    }

    /// Load `input` and process it; a read or parse failure aborts before any work
    pub async fn process_file(&self, input: &Path) -> Result<BatchReport, BatchError> {
        let items = match load_items(input).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %e, "Invalid input, aborting run");
                return Err(e);
            }
        };

        Ok(self.process_items(items).await)
    }

    /// Resume, then run the remaining items through the worker pool
    pub async fn process_items(&self, items: Vec<PostItem>) -> BatchReport {
        let last_completed = self.progress.last_completed_id().await;
        tracing::info!(
            "Last processed shortcode: {}",
            last_completed.as_deref().unwrap_or("none")
        );

        let (resumed_past, remaining) = resume_after(items, last_completed.as_deref());

        if remaining.is_empty() {
            tracing::info!("All posts already processed.");
            return BatchReport {
                resumed_past,
                outcomes: Vec::new(),
            };
        }

        let total = remaining.len();
        tracing::info!(workers = self.workers, "Processing {} posts", total);

        let mut results = stream::iter(remaining)
            .map(|post| {
                let worker = self.clone();
                async move { worker.spawn_post(post).await }
            })
            .buffer_unordered(self.workers);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = results.next().await {
            tracing::info!("{}", outcome);
            outcomes.push(outcome);

            let done = outcomes.len();
            if done % PROGRESS_LOG_INTERVAL == 0 || done == total {
                tracing::debug!(progress = format!("{}/{}", done, total), "Batch progress");
            }
        }

        let report = BatchReport {
            resumed_past,
            outcomes,
        };

        tracing::info!(
            total,
            saved = report.saved(),
            failed = report.failed(),
            cached = report.cached(),
            skipped = report.skipped(),
            "Batch complete"
        );

        report
    }

    /// Run one item on its own task so a panic stays contained
    async fn spawn_post(self, post: PostItem) -> ItemOutcome {
        let fallback = post.clone();
        let worker = self.clone();

        match tokio::spawn(async move { worker.process_post(post).await }).await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                let handle = fallback.handle().to_string();
                let cause = format!("Worker error: {}", join_error);
                match fallback.shortcode() {
                    Some(shortcode) => {
                        self.save_failure(shortcode, &fallback, handle, cause)
                            .await
                    }
                    None => ItemOutcome::Failed {
                        handle,
                        cause,
                        path: None,
                    },
                }
            }
        }
    }

    /// Per-item procedure; idempotent and never fails
    pub async fn process_post(&self, post: PostItem) -> ItemOutcome {
        let handle = post.handle().to_string();

        let Some(shortcode) = post.shortcode().map(str::to_string) else {
            tracing::warn!(handle = %handle, "Skipping post without shortcode");
            return ItemOutcome::Skipped { handle };
        };

        if self.store.exists(Namespace::Completed, &shortcode).await {
            return ItemOutcome::Cached { handle };
        }

        self.jitter_delay().await;

        let display_url = match self.lookup.display_url(&post_url(&shortcode)).await {
            Ok(url) => url,
            Err(e) => {
                return self
                    .save_failure(&shortcode, &post, handle, e.to_string())
                    .await
            }
        };

        let enriched = post.enriched(&display_url);
        match self
            .store
            .write(Namespace::Completed, &shortcode, &enriched)
            .await
        {
            Some(path) => {
                self.progress.record_completed(&shortcode).await;
                self.clear_stale_failure(&shortcode).await;
                ItemOutcome::Saved { handle, path }
            }
            None => {
                self.save_failure(&shortcode, &post, handle, "Save failed".to_string())
                    .await
            }
        }
    }

    /// Keep the original record in the failed namespace for a later retry pass
    async fn save_failure(
        &self,
        shortcode: &str,
        post: &PostItem,
        handle: String,
        cause: String,
    ) -> ItemOutcome {
        let path = self.store.write(Namespace::Failed, shortcode, post).await;
        ItemOutcome::Failed {
            handle,
            cause,
            path,
        }
    }

    /// A shortcode lives in one namespace only
    async fn clear_stale_failure(&self, shortcode: &str) {
        if !self.store.exists(Namespace::Failed, shortcode).await {
            return;
        }
        if let Err(e) = self.store.remove(Namespace::Failed, shortcode).await {
            tracing::warn!(shortcode = %shortcode, error = %e, "Could not remove stale failed record");
        }
    }

    async fn jitter_delay(&self) {
        if self.jitter_max_ms == 0 {
            return;
        }
        let delay_ms = rand::thread_rng().gen_range(self.jitter_min_ms..=self.jitter_max_ms);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
