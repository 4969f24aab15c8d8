//! Resource loaders
//!
//! Everything here implements the one [`Loader`] capability: take a URL and a
//! completion callback, return a cancellable handle. Behaviour is layered by
//! wrapping loaders in other loaders:
//!
//! - [`RemoteLoader`] fetches through an [`HttpClient`](crate::http::HttpClient)
//!   and maps the response.
//! - [`CachingLoader`] writes successful results into a cache in the
//!   background.
//! - [`FallbackLoader`] tries a primary loader and switches to a fallback
//!   when it fails.
//! - [`LocalFeedLoader`] and [`LocalImageLoader`] serve from a store.
//! - [`LoadFuture`] turns any loader into a cold future or stream.

mod bridge;
mod caching;
mod fallback;
mod local;
mod remote;

#[cfg(test)]
pub(crate) mod test_support;

pub use bridge::{LoadFuture, LoaderExt};
pub use caching::{CachingLoader, ResourceCache};
pub use fallback::FallbackLoader;
pub use local::{Clock, FeedPageCache, LocalFeedLoader, LocalImageLoader};
pub use remote::{Mapper, RemoteLoader};

use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::cache::StoreError;
use crate::data::MapperError;
use crate::http::HttpClientError;
use crate::task::{Completion, TaskHandle};

/// Why a load produced no resource
#[derive(Debug, Error)]
pub enum LoadError {
    /// The remote origin could not be reached
    #[error("Could not reach the remote origin")]
    Connectivity(#[source] HttpClientError),

    /// A response arrived but was rejected
    #[error("Invalid data from the remote origin")]
    InvalidData(#[source] MapperError),

    /// The local store has nothing (usable) for the request
    #[error("Nothing cached for this resource")]
    NotFound,

    /// The local store could not be read
    #[error("Cache read failed")]
    Failed(#[source] StoreError),
}

pub type LoadResult<R> = Result<R, LoadError>;

/// Produces a resource for a URL, reporting through a one-shot callback
///
/// Each call completes at most once. Cancelling the returned handle before
/// the result arrives means the callback is never invoked.
pub trait Loader: Send + Sync {
    type Resource: Send + 'static;

    fn load(&self, url: &Url, completion: Completion<LoadResult<Self::Resource>>) -> TaskHandle;
}

impl<L: Loader + ?Sized> Loader for Arc<L> {
    type Resource = L::Resource;

    fn load(&self, url: &Url, completion: Completion<LoadResult<Self::Resource>>) -> TaskHandle {
        (**self).load(url, completion)
    }
}

impl<L: Loader + ?Sized> Loader for &L {
    type Resource = L::Resource;

    fn load(&self, url: &Url, completion: Completion<LoadResult<Self::Resource>>) -> TaskHandle {
        (**self).load(url, completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    fn chain(error: &dyn Error) -> Vec<String> {
        let mut messages = vec![error.to_string()];
        let mut source = error.source();
        while let Some(cause) = source {
            messages.push(cause.to_string());
            source = cause.source();
        }
        messages
    }

    #[test]
    fn test_error_chain_names_each_cause_once() {
        let error = LoadError::Failed(StoreError::Io(io::Error::other("disk full")));

        let messages = chain(&error);

        assert_eq!(messages, vec!["Cache read failed", "Cache I/O failed", "disk full"]);
        let joined = messages.join("\n");
        assert_eq!(joined.matches("disk full").count(), 1);
    }

    #[test]
    fn test_invalid_data_message_leaves_detail_to_source() {
        let parse = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let error = LoadError::InvalidData(MapperError::ParseError(parse));

        let messages = chain(&error);

        assert_eq!(messages[0], "Invalid data from the remote origin");
        assert_eq!(messages[1], "Failed to parse response body");
        assert_eq!(messages.len(), 3);
    }
}
