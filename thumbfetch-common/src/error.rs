//! Common error types for thumbfetch

use thiserror::Error;

/// Common result type for thumbfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the thumbfetch crates
#[derive(Error, Debug)]
pub enum Error {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config file could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
