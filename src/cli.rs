//! Command-line interface parsing for feedkeeper
//!
//! Global options tune the configuration; the subcommand picks which
//! pipeline to run.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::DEFAULT_BASE_URL;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A request timeout of zero would fail every request
    #[error("Invalid timeout: must be at least 1 second")]
    InvalidTimeout,

    /// A maximum cache age of zero would expire every snapshot immediately
    #[error("Invalid max age: must be at least 1 day")]
    InvalidMaxAge,
}

/// feedkeeper - Load an image feed, falling back to a local cache offline
#[derive(Parser, Debug)]
#[command(name = "feedkeeper")]
#[command(about = "Load an image feed, falling back to a local cache offline")]
#[command(version)]
pub struct Cli {
    /// Root URL of the feed API
    #[arg(long, global = true, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// Directory for cached feed and image data
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Days a cached feed stays usable
    #[arg(long, global = true, value_name = "DAYS")]
    pub max_age_days: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the feed, from the network or else the cache
    Feed {
        /// Load the page following the record with this id
        #[arg(long, value_name = "UUID")]
        after: Option<Uuid>,
    },

    /// Load an image, from the cache or else the network
    Image {
        url: Url,

        /// Write the image bytes to FILE
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Load the comments for an image
    Comments { image_id: Uuid },

    /// Delete the cached feed if it is expired or unreadable
    Validate,

    /// Delete the cached feed
    Clear,
}
