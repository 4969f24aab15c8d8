//! Loaders that serve from the local store
//!
//! These expose a store through the same [`Loader`] interface as the remote
//! loaders, so a [`FallbackLoader`](super::FallbackLoader) can put one behind
//! a network loader. They also act as the write side of the cache for
//! [`CachingLoader`](super::CachingLoader).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use url::Url;
use uuid::Uuid;

use super::{LoadError, LoadResult, Loader, ResourceCache};
use crate::cache::{FeedCachePolicy, FeedStore, ImageStore, StoreError};
use crate::data::{FeedEndpoint, FeedRecord};
use crate::task::{Completion, SpawnedTask, TaskHandle, TaskWrapper};

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Runs a blocking store call on the runtime's blocking pool
fn spawn_store_call<R, F>(
    runtime: &Handle,
    completion: Completion<LoadResult<R>>,
    call: F,
) -> TaskHandle
where
    R: Send + 'static,
    F: FnOnce() -> LoadResult<R> + Send + 'static,
{
    let wrapper = TaskWrapper::new(completion);
    let delivery = Arc::clone(&wrapper);
    let join = runtime.spawn_blocking(move || delivery.complete(call()));
    wrapper.attach(Box::new(SpawnedTask::new(join.abort_handle())));
    Box::new(wrapper)
}

/// Serves the cached feed snapshot, applying the expiry policy
///
/// The snapshot is not keyed by URL; `load` ignores the URL it is given.
pub struct LocalFeedLoader<S> {
    store: Arc<S>,
    policy: FeedCachePolicy,
    clock: Clock,
    runtime: Handle,
}

impl<S> Clone for LocalFeedLoader<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
            clock: Arc::clone(&self.clock),
            runtime: self.runtime.clone(),
        }
    }
}

impl<S: FeedStore + 'static> LocalFeedLoader<S> {
    /// Loader with the default seven-day policy and the system clock
    pub fn new(store: Arc<S>, runtime: Handle) -> Self {
        Self {
            store,
            policy: FeedCachePolicy::default(),
            clock: Arc::new(Utc::now),
            runtime,
        }
    }

    pub fn with_policy(mut self, policy: FeedCachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the cached snapshot with `items`, stamped with the current time
    pub fn save(&self, items: &[FeedRecord]) -> Result<(), StoreError> {
        self.store.insert(items, (self.clock)())
    }

    /// Appends `page` to the snapshot if the snapshot ends with the record `after`
    ///
    /// The snapshot keeps its timestamp, so a later page never extends how
    /// long the head page may be served. Returns whether anything was written.
    pub fn append(&self, page: &[FeedRecord], after: Uuid) -> Result<bool, StoreError> {
        let Some(snapshot) = self.store.retrieve()? else {
            tracing::debug!(%after, "no cached feed to extend");
            return Ok(false);
        };
        if snapshot.items.last().map(|record| record.id) != Some(after) {
            tracing::debug!(%after, "cached feed does not end at cursor, skipping page");
            return Ok(false);
        }

        let mut items = snapshot.items;
        items.extend_from_slice(page);
        self.store.insert(&items, snapshot.timestamp)?;
        Ok(true)
    }

    /// Reads the snapshot on the calling thread
    ///
    /// A missing or expired snapshot is [`LoadError::NotFound`]; a store
    /// failure is [`LoadError::Failed`].
    pub fn load_cached(&self) -> LoadResult<Vec<FeedRecord>> {
        match self.store.retrieve() {
            Ok(Some(snapshot)) if self.policy.validate(snapshot.timestamp, (self.clock)()) => {
                tracing::debug!(items = snapshot.items.len(), "serving cached feed");
                Ok(snapshot.items)
            }
            Ok(Some(snapshot)) => {
                tracing::debug!(cached_at = %snapshot.timestamp, "cached feed expired");
                Err(LoadError::NotFound)
            }
            Ok(None) => Err(LoadError::NotFound),
            Err(error) => Err(LoadError::Failed(error)),
        }
    }

    /// Deletes the snapshot if it is expired or unreadable
    ///
    /// A fresh snapshot, or no snapshot, is left alone.
    pub fn validate_cache(&self) -> Result<(), StoreError> {
        match self.store.retrieve() {
            Err(error) => {
                tracing::warn!(
                    error = &error as &dyn std::error::Error,
                    "deleting unreadable feed cache"
                );
                self.store.delete()
            }
            Ok(Some(snapshot)) if !self.policy.validate(snapshot.timestamp, (self.clock)()) => {
                tracing::warn!(cached_at = %snapshot.timestamp, "deleting expired feed cache");
                self.store.delete()
            }
            Ok(_) => Ok(()),
        }
    }
}

impl<S: FeedStore + 'static> Loader for LocalFeedLoader<S> {
    type Resource = Vec<FeedRecord>;

    fn load(
        &self,
        _url: &Url,
        completion: Completion<LoadResult<Vec<FeedRecord>>>,
    ) -> TaskHandle {
        let loader = self.clone();
        spawn_store_call(&self.runtime, completion, move || loader.load_cached())
    }
}

impl<S: FeedStore + 'static> ResourceCache<Vec<FeedRecord>> for LocalFeedLoader<S> {
    fn save(&self, items: &Vec<FeedRecord>, _url: &Url) -> Result<(), StoreError> {
        LocalFeedLoader::save(self, items)
    }
}

/// Write side for later feed pages
///
/// Saving a page appends it to the cached snapshot instead of replacing the
/// snapshot, and only when the page's `after_id` is the last cached record.
/// A first-page URL replaces the snapshot as usual.
pub struct FeedPageCache<S> {
    local: LocalFeedLoader<S>,
}

impl<S: FeedStore + 'static> FeedPageCache<S> {
    pub fn new(local: LocalFeedLoader<S>) -> Self {
        Self { local }
    }
}

impl<S: FeedStore + 'static> ResourceCache<Vec<FeedRecord>> for FeedPageCache<S> {
    fn save(&self, page: &Vec<FeedRecord>, url: &Url) -> Result<(), StoreError> {
        match FeedEndpoint::cursor(url) {
            Some(after) => self.local.append(page, after).map(|_| ()),
            None => self.local.save(page),
        }
    }
}

/// Serves cached image bytes by URL
pub struct LocalImageLoader<S> {
    store: Arc<S>,
    runtime: Handle,
}

impl<S> Clone for LocalImageLoader<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            runtime: self.runtime.clone(),
        }
    }
}

impl<S: ImageStore + 'static> LocalImageLoader<S> {
    pub fn new(store: Arc<S>, runtime: Handle) -> Self {
        Self { store, runtime }
    }

    pub fn save(&self, data: &[u8], url: &Url) -> Result<(), StoreError> {
        self.store.insert_data(data, url)
    }

    /// Reads the blob for `url` on the calling thread
    pub fn load_cached(&self, url: &Url) -> LoadResult<Vec<u8>> {
        match self.store.retrieve_data(url) {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(LoadError::NotFound),
            Err(error) => Err(LoadError::Failed(error)),
        }
    }
}

impl<S: ImageStore + 'static> Loader for LocalImageLoader<S> {
    type Resource = Vec<u8>;

    fn load(&self, url: &Url, completion: Completion<LoadResult<Vec<u8>>>) -> TaskHandle {
        let loader = self.clone();
        let url = url.clone();
        spawn_store_call(&self.runtime, completion, move || loader.load_cached(&url))
    }
}

impl<S: ImageStore + 'static> ResourceCache<Vec<u8>> for LocalImageLoader<S> {
    fn save(&self, data: &Vec<u8>, url: &Url) -> Result<(), StoreError> {
        LocalImageLoader::save(self, data, url)
    }
}
