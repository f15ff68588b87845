//! Data models for thumbfetch
//!
//! - Post records read from the input batch
//! - Outcome lines and run reports

pub mod outcome;
pub mod post_item;

pub use outcome::{BatchReport, ItemOutcome, RetryOutcome, RetryReport};
pub use post_item::{PostItem, UNKNOWN_HANDLE};
