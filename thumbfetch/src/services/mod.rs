//! Service modules for the enrichment pipeline
//!
//! Leaves first:
//! - `lookup_client`: display-URL lookup against the GraphQL endpoint
//! - `item_store`: one JSON file per item, completed and failed namespaces
//! - `progress_tracker`: resume point from the progress log
//! - `batch_processor`: primary pass over an input batch
//! - `retry_processor`: second chance for failed records

pub mod batch_processor;
pub mod item_store;
pub mod lookup_client;
pub mod progress_tracker;
pub mod retry_processor;
pub mod status;

pub use batch_processor::{load_items, resume_after, BatchError, BatchProcessor};
pub use item_store::{ItemStore, Namespace, StoreError};
pub use lookup_client::{
    normalize_shortcode, post_url, DisplayUrlLookup, GraphQlClient, LookupError,
};
pub use progress_tracker::ProgressTracker;
pub use retry_processor::RetryProcessor;
pub use status::{store_status, StoreStatus};
