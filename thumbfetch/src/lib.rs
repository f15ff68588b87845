//! thumbfetch library interface
//!
//! Exposes the pipeline components for the binary and for integration testing.

pub mod models;
pub mod services;
pub mod utils;

pub use thumbfetch_common::FetchConfig;

use std::sync::Arc;

use crate::services::{
    BatchProcessor, DisplayUrlLookup, GraphQlClient, ItemStore, LookupError, ProgressTracker,
    RetryProcessor, StoreError,
};

/// Shared components, built once from the resolved configuration
#[derive(Clone)]
pub struct Pipeline {
    pub config: FetchConfig,
    pub lookup: Arc<dyn DisplayUrlLookup>,
    pub store: Arc<ItemStore>,
    pub progress: Arc<ProgressTracker>,
}

impl Pipeline {
    /// Wire components around an arbitrary lookup implementation
    pub fn new(config: FetchConfig, lookup: Arc<dyn DisplayUrlLookup>) -> Self {
        let store = Arc::new(ItemStore::new(&config));
        let progress = Arc::new(ProgressTracker::new(&config));
        Self {
            config,
            lookup,
            store,
            progress,
        }
    }

    /// Wire components around the real GraphQL client
    pub fn with_graphql(config: FetchConfig) -> Result<Self, LookupError> {
        let client = GraphQlClient::new(&config)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Create the completed and failed directories
    pub async fn init(&self) -> Result<(), StoreError> {
        self.store.ensure_dirs().await
    }

    pub fn batch_processor(&self) -> BatchProcessor {
        BatchProcessor::new(
            &self.config,
            Arc::clone(&self.lookup),
            Arc::clone(&self.store),
            Arc::clone(&self.progress),
        )
    }

    pub fn retry_processor(&self) -> RetryProcessor {
        RetryProcessor::new(&self.config, Arc::clone(&self.lookup), Arc::clone(&self.store))
    }
}
