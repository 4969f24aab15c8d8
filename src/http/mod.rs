//! HTTP transport capability
//!
//! Loaders never talk to the network directly. They go through the
//! [`HttpClient`] trait, which performs a single GET and reports the status
//! metadata and raw body through a completion callback.

mod reqwest_client;

pub use reqwest_client::ReqwestHttpClient;

use thiserror::Error;
use url::Url;

use crate::task::{Completion, TaskHandle};

/// Status metadata of a completed HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Final URL of the response, after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
}

impl HttpResponse {
    pub fn new(url: Url, status: u16) -> Self {
        Self { url, status }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The request could not be sent or the body could not be read
    #[error("HTTP request failed")]
    RequestFailed(#[from] reqwest::Error),

    /// Connection-level failure reported by a non-reqwest transport
    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Outcome of a GET: status metadata plus body bytes
pub type HttpResult = Result<(HttpResponse, Vec<u8>), HttpClientError>;

/// Performs GET requests
///
/// Completions may arrive on any thread. Cancelling the returned handle must
/// stop the completion from being invoked.
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &Url, completion: Completion<HttpResult>) -> TaskHandle;
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn get(&self, url: &Url, completion: Completion<HttpResult>) -> TaskHandle {
        (**self).get(url, completion)
    }
}
