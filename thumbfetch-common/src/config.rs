//! Configuration loading and resolution
//!
//! A single [`FetchConfig`] is resolved at startup and handed to every
//! component at construction. Resolution priority, highest first:
//! 1. Command-line arguments ([`ConfigOverrides`])
//! 2. Environment variables (`PROXY_URL`, `THUMBFETCH_DATA_DIR`, `THUMBFETCH_ERROR_DIR`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: defaults apply and a debug line is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "THUMBFETCH_CONFIG";
/// Environment variable naming a forward proxy for HTTP and HTTPS traffic
pub const PROXY_ENV_VAR: &str = "PROXY_URL";
pub const DATA_DIR_ENV_VAR: &str = "THUMBFETCH_DATA_DIR";
pub const ERROR_DIR_ENV_VAR: &str = "THUMBFETCH_ERROR_DIR";

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "thumbfetch.toml";

const DEFAULT_ENDPOINT: &str = "https://www.instagram.com/graphql/query/";
const DEFAULT_DOC_ID: &str = "8845758582119845";
const DEFAULT_APP_ID: &str = "936619743392459";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Fully resolved runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchConfig {
    /// Completed namespace directory
    pub data_dir: PathBuf,
    /// Failed namespace directory
    pub error_dir: PathBuf,
    /// Append-only checkpoint of completed shortcodes, a sibling of `data_dir` by default
    pub progress_log: PathBuf,
    /// Input batch used when `process` is given no path
    pub input_file: PathBuf,
    /// Concurrent workers for the primary pass
    pub batch_workers: usize,
    /// Concurrent workers for the retry pass
    pub retry_workers: usize,
    /// Lower bound of the pre-request jitter, milliseconds
    pub jitter_min_ms: u64,
    /// Upper bound of the pre-request jitter, milliseconds
    pub jitter_max_ms: u64,
    pub request_timeout_secs: u64,
    /// Transport-level retries for connect errors and timeouts
    pub max_transport_retries: u32,
    pub proxy_url: Option<String>,
    /// GraphQL query endpoint
    pub endpoint: String,
    pub doc_id: String,
    pub app_id: String,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            error_dir: PathBuf::from("error"),
            progress_log: progress_log_for(Path::new("data")),
            input_file: PathBuf::from("test.instagramPosts.json"),
            batch_workers: 20,
            retry_workers: 10,
            jitter_min_ms: 500,
            jitter_max_ms: 1500,
            request_timeout_secs: 15,
            max_transport_retries: 3,
            proxy_url: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            doc_id: DEFAULT_DOC_ID.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Optional settings as read from the TOML file
///
/// Every field is optional; absent fields fall through to the compiled default.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub data_dir: Option<PathBuf>,
    pub error_dir: Option<PathBuf>,
    pub progress_log: Option<PathBuf>,
    pub input_file: Option<PathBuf>,
    pub batch_workers: Option<usize>,
    pub retry_workers: Option<usize>,
    pub jitter_min_ms: Option<u64>,
    pub jitter_max_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_transport_retries: Option<u32>,
    pub proxy_url: Option<String>,
    pub endpoint: Option<String>,
    pub doc_id: Option<String>,
    pub app_id: Option<String>,
    pub user_agent: Option<String>,
}

/// Settings taken from environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub proxy_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub error_dir: Option<PathBuf>,
}

impl EnvConfig {
    /// Read the process environment; empty values count as unset
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        }

        Self {
            proxy_url: var(PROXY_ENV_VAR),
            data_dir: var(DATA_DIR_ENV_VAR).map(PathBuf::from),
            error_dir: var(ERROR_DIR_ENV_VAR).map(PathBuf::from),
        }
    }
}

/// Command-line overrides (highest priority)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub error_dir: Option<PathBuf>,
    pub proxy_url: Option<String>,
    pub batch_workers: Option<usize>,
    pub retry_workers: Option<usize>,
}

impl FetchConfig {
    /// Resolve configuration from CLI overrides, environment, TOML file and defaults
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let toml_config = match locate_config_file(overrides.config_path.as_deref()) {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                load_toml_config(&path)?
            }
            None => {
                debug!("No config file found, using defaults");
                TomlConfig::default()
            }
        };

        Self::from_layers(toml_config, EnvConfig::from_env(), overrides)
    }

    /// Merge the layers without touching the filesystem or environment
    pub fn from_layers(
        toml_config: TomlConfig,
        env: EnvConfig,
        cli: &ConfigOverrides,
    ) -> Result<Self> {
        let defaults = Self::default();

        let data_dir = cli
            .data_dir
            .clone()
            .or(env.data_dir)
            .or(toml_config.data_dir)
            .unwrap_or(defaults.data_dir);
        let progress_log = toml_config
            .progress_log
            .unwrap_or_else(|| progress_log_for(&data_dir));

        let config = Self {
            data_dir,
            error_dir: cli
                .error_dir
                .clone()
                .or(env.error_dir)
                .or(toml_config.error_dir)
                .unwrap_or(defaults.error_dir),
            progress_log,
            input_file: toml_config.input_file.unwrap_or(defaults.input_file),
            batch_workers: cli
                .batch_workers
                .or(toml_config.batch_workers)
                .unwrap_or(defaults.batch_workers),
            retry_workers: cli
                .retry_workers
                .or(toml_config.retry_workers)
                .unwrap_or(defaults.retry_workers),
            jitter_min_ms: toml_config.jitter_min_ms.unwrap_or(defaults.jitter_min_ms),
            jitter_max_ms: toml_config.jitter_max_ms.unwrap_or(defaults.jitter_max_ms),
            request_timeout_secs: toml_config
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            max_transport_retries: toml_config
                .max_transport_retries
                .unwrap_or(defaults.max_transport_retries),
            proxy_url: cli
                .proxy_url
                .clone()
                .or(env.proxy_url)
                .or(toml_config.proxy_url),
            endpoint: toml_config.endpoint.unwrap_or(defaults.endpoint),
            doc_id: toml_config.doc_id.unwrap_or(defaults.doc_id),
            app_id: toml_config.app_id.unwrap_or(defaults.app_id),
            user_agent: toml_config.user_agent.unwrap_or(defaults.user_agent),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch_workers == 0 {
            return Err(Error::Config("batch_workers must be at least 1".to_string()));
        }
        if self.retry_workers == 0 {
            return Err(Error::Config("retry_workers must be at least 1".to_string()));
        }
        if self.jitter_min_ms > self.jitter_max_ms {
            return Err(Error::Config(format!(
                "jitter_min_ms ({}) exceeds jitter_max_ms ({})",
                self.jitter_min_ms, self.jitter_max_ms
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(Error::Config("endpoint must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configuration for tests: zero jitter, the given pool size, everything under `root`
    pub fn for_root(root: &Path, workers: usize) -> Self {
        Self {
            data_dir: root.join("data"),
            error_dir: root.join("error"),
            progress_log: progress_log_for(&root.join("data")),
            input_file: root.join("posts.json"),
            batch_workers: workers,
            retry_workers: workers,
            jitter_min_ms: 0,
            jitter_max_ms: 0,
            ..Self::default()
        }
    }
}

/// Pick the config file: explicit path, then `THUMBFETCH_CONFIG`, then `./thumbfetch.toml`
///
/// An explicit path is returned even if it does not exist so the load reports it.
fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.exists().then_some(local)
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Default progress log for a completed directory: `<data_dir>.progress.log` beside it
///
/// Each data directory gets its own checkpoint.
pub fn progress_log_for(data_dir: &Path) -> PathBuf {
    match data_dir.file_name() {
        Some(name) => {
            let mut log_name = name.to_os_string();
            log_name.push(".progress.log");
            data_dir.with_file_name(log_name)
        }
        None => data_dir.join("progress.log"),
    }
}
