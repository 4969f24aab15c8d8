//! [`HttpClient`] backed by reqwest

use reqwest::Client;
use tokio::runtime::Handle;
use url::Url;

use super::{HttpClient, HttpResponse, HttpResult};
use crate::task::{Completion, SpawnedTask, TaskHandle, TaskWrapper};

/// Runs each GET as a task on a tokio runtime
///
/// Timeouts are whatever the wrapped [`Client`] was built with.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    runtime: Handle,
}

impl ReqwestHttpClient {
    /// Create a client that spawns requests on `runtime`
    pub fn new(client: Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }

    /// Create a client with default reqwest settings on the current runtime
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_current_runtime() -> Self {
        Self::new(Client::new(), Handle::current())
    }

    async fn fetch(client: Client, url: Url) -> HttpResult {
        let response = client.get(url).send().await?;
        let metadata = HttpResponse::new(response.url().clone(), response.status().as_u16());
        let body = response.bytes().await?;
        Ok((metadata, body.to_vec()))
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get(&self, url: &Url, completion: Completion<HttpResult>) -> TaskHandle {
        let wrapper = TaskWrapper::new(completion);
        let client = self.client.clone();
        let url = url.clone();

        let delivery = wrapper.clone();
        let join = self.runtime.spawn(async move {
            tracing::debug!(%url, "GET");
            let result = Self::fetch(client, url).await;
            delivery.complete(result);
        });
        wrapper.attach(Box::new(SpawnedTask::new(join.abort_handle())));

        Box::new(wrapper)
    }
}
