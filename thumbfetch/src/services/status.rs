//! Read-only summary of the on-disk state

use crate::services::item_store::{ItemStore, Namespace, StoreError};
use crate::services::progress_tracker::ProgressTracker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub completed: usize,
    pub failed: usize,
    pub resume_point: Option<String>,
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} completed, {} failed, resume after: {}",
            self.completed,
            self.failed,
            self.resume_point.as_deref().unwrap_or("none")
        )
    }
}

pub async fn store_status(
    store: &ItemStore,
    progress: &ProgressTracker,
) -> Result<StoreStatus, StoreError> {
    Ok(StoreStatus {
        completed: store.list(Namespace::Completed).await?.len(),
        failed: store.list(Namespace::Failed).await?.len(),
        resume_point: progress.last_completed_id().await,
    })
}
