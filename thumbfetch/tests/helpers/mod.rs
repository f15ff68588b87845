//! Test Helper Utilities
//!
//! Shared utilities for testing thumbfetch

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;
pub mod stub_lookup;

// Re-export commonly used items
pub use fixtures::{read_json, test_pipeline, write_batch};
pub use log_capture::LogCapture;
pub use stub_lookup::StubLookup;
