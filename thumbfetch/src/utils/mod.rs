//! Utility modules for thumbfetch

pub mod transport_retry;

pub use transport_retry::retry_transient;
