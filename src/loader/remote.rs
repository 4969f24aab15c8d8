//! Single-shot remote fetch

use std::sync::Arc;

use url::Url;

use super::{LoadError, LoadResult, Loader};
use crate::data::{self, FeedRecord, ImageComment, MapperError};
use crate::http::{HttpClient, HttpResponse, HttpResult};
use crate::task::{Completion, TaskHandle, TaskWrapper};

/// Turns a response into a resource, or rejects it
pub type Mapper<R> = Arc<dyn Fn(&HttpResponse, &[u8]) -> Result<R, MapperError> + Send + Sync>;

/// Fetches a URL through an [`HttpClient`] and maps the response
///
/// Transport failures become [`LoadError::Connectivity`]; anything the mapper
/// rejects becomes [`LoadError::InvalidData`]. No retries.
pub struct RemoteLoader<R> {
    client: Arc<dyn HttpClient>,
    mapper: Mapper<R>,
}

impl<R> Clone for RemoteLoader<R> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<R> RemoteLoader<R> {
    pub fn new<F>(client: Arc<dyn HttpClient>, mapper: F) -> Self
    where
        F: Fn(&HttpResponse, &[u8]) -> Result<R, MapperError> + Send + Sync + 'static,
    {
        Self {
            client,
            mapper: Arc::new(mapper),
        }
    }
}

impl RemoteLoader<Vec<FeedRecord>> {
    /// Loader for the feed listing
    pub fn feed(client: Arc<dyn HttpClient>) -> Self {
        Self::new(client, data::map_feed_items)
    }
}

impl RemoteLoader<Vec<u8>> {
    /// Loader for raw image bytes
    pub fn image_data(client: Arc<dyn HttpClient>) -> Self {
        Self::new(client, data::map_image_data)
    }
}

impl RemoteLoader<Vec<ImageComment>> {
    /// Loader for an image's comments
    pub fn image_comments(client: Arc<dyn HttpClient>) -> Self {
        Self::new(client, data::map_image_comments)
    }
}

fn map_result<R>(mapper: &Mapper<R>, result: HttpResult) -> LoadResult<R> {
    let (response, body) = result.map_err(LoadError::Connectivity)?;
    mapper(&response, &body).map_err(LoadError::InvalidData)
}

impl<R: Send + 'static> Loader for RemoteLoader<R> {
    type Resource = R;

    fn load(&self, url: &Url, completion: Completion<LoadResult<R>>) -> TaskHandle {
        let wrapper = TaskWrapper::new(completion);
        let mapper = Arc::clone(&self.mapper);

        let delivery = Arc::clone(&wrapper);
        let task = self.client.get(
            url,
            Box::new(move |result| delivery.complete(map_result(&mapper, result))),
        );
        wrapper.attach(task);

        Box::new(wrapper)
    }
}
