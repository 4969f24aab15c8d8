//! Primary-then-fallback composite

use std::sync::Arc;

use url::Url;

use super::{LoadResult, Loader};
use crate::task::{Completion, TaskHandle, TaskWrapper};

/// Loads from `primary`, and from `fallback` only if the primary fails
///
/// There is exactly one fallback hop. The primary's error is discarded once
/// the fallback runs; the caller sees whatever the fallback produces.
/// Cancelling the returned handle cancels whichever load is in flight.
pub struct FallbackLoader<P, F> {
    primary: P,
    fallback: Arc<F>,
}

impl<P, F> FallbackLoader<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback: Arc::new(fallback),
        }
    }
}

impl<P, F> Loader for FallbackLoader<P, F>
where
    P: Loader,
    F: Loader<Resource = P::Resource> + 'static,
{
    type Resource = P::Resource;

    fn load(&self, url: &Url, completion: Completion<LoadResult<P::Resource>>) -> TaskHandle {
        let wrapper = TaskWrapper::new(completion);
        let fallback = Arc::clone(&self.fallback);
        let fallback_url = url.clone();

        let delivery = Arc::clone(&wrapper);
        let primary_task = self.primary.load(
            url,
            Box::new(move |result| match result {
                Ok(resource) => delivery.complete(Ok(resource)),
                Err(_) if delivery.is_cancelled() => {}
                Err(error) => {
                    tracing::debug!(
                        url = %fallback_url,
                        error = &error as &dyn std::error::Error,
                        "primary load failed, trying fallback"
                    );
                    let fallback_delivery = Arc::clone(&delivery);
                    let fallback_task = fallback.load(
                        &fallback_url,
                        Box::new(move |result| fallback_delivery.complete(result)),
                    );
                    delivery.replace(fallback_task);
                }
            }),
        );
        wrapper.attach(primary_task);

        Box::new(wrapper)
    }
}
