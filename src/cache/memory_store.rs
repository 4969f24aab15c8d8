//! Volatile store for tests and runs that should not touch disk

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use url::Url;

use super::{FeedStore, ImageStore, StoreError};
use crate::data::{FeedRecord, FeedSnapshot};

/// Keeps the snapshot and image blobs in process memory
///
/// The image map grows without bound; nothing is ever evicted.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    feed: RwLock<Option<FeedSnapshot>>,
    images: RwLock<HashMap<Url, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a snapshot
    pub fn with_snapshot(snapshot: FeedSnapshot) -> Self {
        Self {
            feed: RwLock::new(Some(snapshot)),
            images: RwLock::default(),
        }
    }
}

impl FeedStore for InMemoryStore {
    fn retrieve(&self) -> Result<Option<FeedSnapshot>, StoreError> {
        Ok(self
            .feed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn insert(&self, items: &[FeedRecord], timestamp: DateTime<Utc>) -> Result<(), StoreError> {
        let snapshot = FeedSnapshot::new(items.to_vec(), timestamp);
        *self.feed.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        Ok(())
    }

    fn delete(&self) -> Result<(), StoreError> {
        *self.feed.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

impl ImageStore for InMemoryStore {
    fn retrieve_data(&self, url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .images
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned())
    }

    fn insert_data(&self, data: &[u8], url: &Url) -> Result<(), StoreError> {
        self.images
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), data.to_vec());
        Ok(())
    }
}
