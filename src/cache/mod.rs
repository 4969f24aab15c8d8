//! Local cache for the feed snapshot and image data
//!
//! The store traits are synchronous and thread-safe: each implementation owns
//! its own locking, so callers never coordinate access themselves. Loaders
//! move store calls onto tokio's blocking pool.
//!
//! Two backends are provided: [`FileStore`] persists to disk, and
//! [`InMemoryStore`] keeps everything in process memory.

mod file_store;
mod memory_store;
mod policy;

pub use file_store::FileStore;
pub use memory_store::InMemoryStore;
pub use policy::{FeedCachePolicy, MAX_CACHE_AGE_DAYS};

use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::data::{FeedRecord, FeedSnapshot};

/// Errors surfaced by a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the storage medium failed
    #[error("Cache I/O failed")]
    Io(#[from] io::Error),

    /// Persisted data could not be encoded or decoded
    #[error("Cache data is corrupt")]
    Codec(#[from] serde_json::Error),

    /// The finished temp file could not be moved into place
    #[error("Failed to replace cache file")]
    Persist(#[from] tempfile::PersistError),
}

/// Holds the single current feed snapshot
pub trait FeedStore: Send + Sync {
    /// Returns the snapshot, or `None` if nothing is stored
    fn retrieve(&self) -> Result<Option<FeedSnapshot>, StoreError>;

    /// Replaces any stored snapshot with `items` stamped at `timestamp`
    fn insert(&self, items: &[FeedRecord], timestamp: DateTime<Utc>) -> Result<(), StoreError>;

    /// Removes the snapshot; succeeds if there is none
    fn delete(&self) -> Result<(), StoreError>;
}

/// Holds image bytes keyed by URL, at most one blob per URL
pub trait ImageStore: Send + Sync {
    fn retrieve_data(&self, url: &Url) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `data` for `url`, overwriting any previous blob
    fn insert_data(&self, data: &[u8], url: &Url) -> Result<(), StoreError>;
}

impl<S: FeedStore + ?Sized> FeedStore for Arc<S> {
    fn retrieve(&self) -> Result<Option<FeedSnapshot>, StoreError> {
        (**self).retrieve()
    }

    fn insert(&self, items: &[FeedRecord], timestamp: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).insert(items, timestamp)
    }

    fn delete(&self) -> Result<(), StoreError> {
        (**self).delete()
    }
}

impl<S: ImageStore + ?Sized> ImageStore for Arc<S> {
    fn retrieve_data(&self, url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).retrieve_data(url)
    }

    fn insert_data(&self, data: &[u8], url: &Url) -> Result<(), StoreError> {
        (**self).insert_data(data, url)
    }
}
