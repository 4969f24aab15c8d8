//! Cache-aside decorator

use std::sync::Arc;

use tokio::runtime::Handle;
use url::Url;

use super::{LoadResult, Loader};
use crate::cache::StoreError;
use crate::task::{Completion, TaskHandle};

/// Write side of a cache for one resource type
pub trait ResourceCache<R>: Send + Sync + 'static {
    fn save(&self, resource: &R, url: &Url) -> Result<(), StoreError>;
}

impl<R, C: ResourceCache<R>> ResourceCache<R> for Arc<C> {
    fn save(&self, resource: &R, url: &Url) -> Result<(), StoreError> {
        (**self).save(resource, url)
    }
}

/// Wraps a loader and saves every successful result into a cache
///
/// The save runs on the blocking pool and is never awaited. Its outcome is
/// logged and dropped; the caller's result is passed on as soon as the inner
/// loader delivers it. The background save holds the cache, not the
/// decorator, so dropping the decorator mid-write is fine.
pub struct CachingLoader<L, C> {
    inner: L,
    cache: Arc<C>,
    runtime: Handle,
}

impl<L, C> CachingLoader<L, C> {
    pub fn new(inner: L, cache: C, runtime: Handle) -> Self {
        Self {
            inner,
            cache: Arc::new(cache),
            runtime,
        }
    }
}

impl<L, C> Loader for CachingLoader<L, C>
where
    L: Loader,
    L::Resource: Clone,
    C: ResourceCache<L::Resource>,
{
    type Resource = L::Resource;

    fn load(&self, url: &Url, completion: Completion<LoadResult<L::Resource>>) -> TaskHandle {
        let cache = Arc::clone(&self.cache);
        let runtime = self.runtime.clone();
        let key = url.clone();

        self.inner.load(
            url,
            Box::new(move |result| {
                if let Ok(resource) = &result {
                    let resource = resource.clone();
                    runtime.spawn_blocking(move || {
                        if let Err(error) = cache.save(&resource, &key) {
                            tracing::warn!(
                                url = %key,
                                error = &error as &dyn std::error::Error,
                                "discarding failed cache write"
                            );
                        }
                    });
                }
                completion(result);
            }),
        )
    }
}
