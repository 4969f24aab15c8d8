//! Composition root
//!
//! Builds the loader pipelines used by the binary. The feed pipeline goes to
//! the network first and falls back to the cache; the image pipeline checks
//! the cache first, since bytes at a given image URL never change. Later feed
//! pages come from the network only and are appended to the cached snapshot.

use std::sync::Arc;

use tokio::runtime::Handle;
use url::Url;
use uuid::Uuid;

use crate::cache::{FeedCachePolicy, FeedStore, ImageStore};
use crate::data::{FeedEndpoint, FeedRecord, ImageComment, ImageCommentsEndpoint};
use crate::http::HttpClient;
use crate::loader::{
    CachingLoader, FallbackLoader, FeedPageCache, LocalFeedLoader, LocalImageLoader, RemoteLoader,
};

/// Remote feed with write-through caching, falling back to the cached snapshot
pub type FeedPipeline<S> = FallbackLoader<
    CachingLoader<RemoteLoader<Vec<FeedRecord>>, LocalFeedLoader<S>>,
    LocalFeedLoader<S>,
>;

/// Remote feed page appended to the cached snapshot, with no fallback
pub type FeedPagePipeline<S> = CachingLoader<RemoteLoader<Vec<FeedRecord>>, FeedPageCache<S>>;

/// Cached image bytes, falling back to a caching remote fetch
pub type ImagePipeline<S> =
    FallbackLoader<LocalImageLoader<S>, CachingLoader<RemoteLoader<Vec<u8>>, LocalImageLoader<S>>>;

/// Wires one HTTP client and one store into the application's loaders
pub struct Composer<S> {
    client: Arc<dyn HttpClient>,
    store: Arc<S>,
    base_url: Url,
    policy: FeedCachePolicy,
    runtime: Handle,
}

impl<S: FeedStore + ImageStore + 'static> Composer<S> {
    pub fn new(client: Arc<dyn HttpClient>, store: Arc<S>, base_url: Url, runtime: Handle) -> Self {
        Self {
            client,
            store,
            base_url,
            policy: FeedCachePolicy::default(),
            runtime,
        }
    }

    pub fn with_policy(mut self, policy: FeedCachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// URL of the first feed page, or of the page after the record `after`
    pub fn feed_url(&self, after: Option<Uuid>) -> Url {
        FeedEndpoint::Get { after }.url(&self.base_url)
    }

    /// URL of the comments for `image_id`
    pub fn comments_url(&self, image_id: Uuid) -> Url {
        ImageCommentsEndpoint::get(image_id).url(&self.base_url)
    }

    pub fn local_feed_loader(&self) -> LocalFeedLoader<S> {
        LocalFeedLoader::new(Arc::clone(&self.store), self.runtime.clone()).with_policy(self.policy)
    }

    pub fn local_image_loader(&self) -> LocalImageLoader<S> {
        LocalImageLoader::new(Arc::clone(&self.store), self.runtime.clone())
    }

    pub fn feed_loader(&self) -> FeedPipeline<S> {
        let remote = RemoteLoader::feed(Arc::clone(&self.client));
        let caching = CachingLoader::new(remote, self.local_feed_loader(), self.runtime.clone());
        FallbackLoader::new(caching, self.local_feed_loader())
    }

    /// Loader for the pages after the first
    ///
    /// The cached snapshot only ever answers for the first page, so a failed
    /// page load reports its own error rather than the cached head.
    pub fn feed_page_loader(&self) -> FeedPagePipeline<S> {
        let remote = RemoteLoader::feed(Arc::clone(&self.client));
        let cache = FeedPageCache::new(self.local_feed_loader());
        CachingLoader::new(remote, cache, self.runtime.clone())
    }

    pub fn image_loader(&self) -> ImagePipeline<S> {
        let remote = RemoteLoader::image_data(Arc::clone(&self.client));
        let caching = CachingLoader::new(remote, self.local_image_loader(), self.runtime.clone());
        FallbackLoader::new(self.local_image_loader(), caching)
    }

    /// Comments are always fetched fresh
    pub fn comments_loader(&self) -> RemoteLoader<Vec<ImageComment>> {
        RemoteLoader::image_comments(Arc::clone(&self.client))
    }
}
