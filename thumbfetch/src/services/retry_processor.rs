//! Maintenance pass: re-attempt every record in the failed namespace
//!
//! A recovered record is written to the completed namespace first and only then
//! removed from the failed one, so a crash in between leaves a duplicate rather
//! than a lost record.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thumbfetch_common::FetchConfig;

use crate::models::{RetryOutcome, RetryReport};
use crate::services::item_store::{ItemStore, Namespace, StoreError};
use crate::services::lookup_client::{post_url, DisplayUrlLookup};

#[derive(Clone)]
pub struct RetryProcessor {
    lookup: Arc<dyn DisplayUrlLookup>,
    store: Arc<ItemStore>,
    workers: usize,
}

impl RetryProcessor {
    pub fn new(
        config: &FetchConfig,
        lookup: Arc<dyn DisplayUrlLookup>,
        store: Arc<ItemStore>,
    ) -> Self {
        Self {
            lookup,
            store,
            workers: config.retry_workers.max(1),
        }
    }

    /// Retry all failed records with `retry_workers` concurrent workers
    ///
    /// Only listing the failed namespace can fail; per-item problems become outcomes.
    pub async fn retry_failed(&self) -> Result<RetryReport, StoreError> {
        let ids = self.store.list(Namespace::Failed).await?;

        if ids.is_empty() {
            tracing::info!("No error posts to retry.");
            return Ok(RetryReport::default());
        }

        let total = ids.len();
        tracing::info!(workers = self.workers, "Retrying {} error posts", total);

        let mut results = stream::iter(ids)
            .map(|id| {
                let worker = self.clone();
                async move {
                    let fallback_handle = id.clone();
                    match tokio::spawn(async move { worker.retry_one(&id).await }).await {
                        Ok(outcome) => outcome,
                        Err(join_error) => RetryOutcome::Error {
                            handle: fallback_handle,
                            cause: format!("Worker error: {}", join_error),
                        },
                    }
                }
            })
            .buffer_unordered(self.workers);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = results.next().await {
            tracing::info!("{}", outcome);
            outcomes.push(outcome);
        }

        let report = RetryReport { outcomes };
        tracing::info!(
            total,
            recovered = report.recovered(),
            remaining = report.remaining(),
            "Retry complete"
        );

        Ok(report)
    }

    /// Re-attempt one failed record identified by its file stem
    pub async fn retry_one(&self, id: &str) -> RetryOutcome {
        let post = match self.store.read(Namespace::Failed, id).await {
            Ok(post) => post,
            Err(e) => {
                return RetryOutcome::Error {
                    handle: id.to_string(),
                    cause: e.to_string(),
                }
            }
        };

        let handle = post.handle().to_string();
        let shortcode = post.shortcode().unwrap_or(id).to_string();

        let display_url = match self.lookup.display_url(&post_url(&shortcode)).await {
            Ok(url) => url,
            Err(e) => {
                return RetryOutcome::StillFailing {
                    handle,
                    cause: e.to_string(),
                }
            }
        };

        let enriched = post.enriched(&display_url);
        let Some(path) = self
            .store
            .write(Namespace::Completed, &shortcode, &enriched)
            .await
        else {
            return RetryOutcome::Error {
                handle,
                cause: "Recovered record could not be saved".to_string(),
            };
        };

        if let Err(e) = self.store.remove(Namespace::Failed, id).await {
            tracing::warn!(shortcode = %shortcode, error = %e, "Recovered record left in failed namespace");
            return RetryOutcome::Error {
                handle,
                cause: format!("saved to {} but {}", path.display(), e),
            };
        }

        RetryOutcome::Recovered { handle, path }
    }
}
