//! Runtime configuration
//!
//! Defaults live here; [`Config::from_cli`] applies command-line overrides.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::cache::{FileStore, MAX_CACHE_AGE_DAYS};
use crate::cli::{Cli, CliError};

/// API the feed is served from unless `--base-url` says otherwise
pub const DEFAULT_BASE_URL: &str = "https://ile-api.essentialdeveloper.com/essential-feed";

/// Cache directory used when the platform has no home directory
const FALLBACK_CACHE_DIR: &str = ".feedkeeper-cache";

/// Seconds before an HTTP request is abandoned
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings the binary runs with
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root of the remote API
    pub base_url: Url,
    /// Directory for the feed snapshot and image blobs
    pub cache_dir: PathBuf,
    /// Applied to the HTTP client, never to the loaders
    pub request_timeout: Duration,
    /// How long a cached feed snapshot may be served
    pub max_cache_age: chrono::Duration,
}

impl Config {
    /// Configuration for `base_url` with every other setting at its default
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            cache_dir: default_cache_dir(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_cache_age: chrono::Duration::days(MAX_CACHE_AGE_DAYS),
        }
    }

    /// Builds the configuration from parsed arguments
    ///
    /// # Returns
    /// * `Err(CliError::InvalidTimeout)` for a zero timeout
    /// * `Err(CliError::InvalidMaxAge)` for a zero maximum age
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut config = Config::new(cli.base_url.clone());

        if let Some(dir) = &cli.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(secs) = cli.timeout {
            if secs == 0 {
                return Err(CliError::InvalidTimeout);
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(days) = cli.max_age_days {
            if days == 0 {
                return Err(CliError::InvalidMaxAge);
            }
            config.max_cache_age = chrono::Duration::days(i64::from(days));
        }

        Ok(config)
    }
}

/// The platform cache directory, or `./.feedkeeper-cache` without one
fn default_cache_dir() -> PathBuf {
    FileStore::new()
        .map(|store| store.root().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR))
}
