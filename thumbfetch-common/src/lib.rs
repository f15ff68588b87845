//! # thumbfetch common library
//!
//! Shared code for the thumbfetch workspace:
//! - Error type and result alias
//! - Configuration struct and its layered resolution

pub mod config;
pub mod error;

pub use config::FetchConfig;
pub use error::{Error, Result};
