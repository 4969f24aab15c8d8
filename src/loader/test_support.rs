//! Test doubles shared by the loader unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url::Url;

use super::{LoadError, LoadResult, Loader};
use crate::http::{HttpClient, HttpClientError, HttpResponse, HttpResult};
use crate::task::{Cancellable, Completion, TaskHandle};

/// Counts how many times a handle was cancelled
#[derive(Debug, Default)]
pub struct CancelCount(AtomicUsize);

impl CancelCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Cancellable for CancelCount {
    fn cancel(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct Request<T> {
    url: Url,
    completion: Option<Completion<T>>,
    cancels: Arc<CancelCount>,
}

/// Records requests and lets the test decide when and how each completes
///
/// Completions are handed back untouched; honouring cancellation is the
/// caller's job, which is exactly what the tests check.
pub struct Pending<T> {
    requests: Mutex<Vec<Request<T>>>,
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Pending<T> {
    fn record(&self, url: &Url, completion: Completion<T>) -> TaskHandle {
        let cancels = Arc::new(CancelCount::default());
        self.requests.lock().unwrap().push(Request {
            url: url.clone(),
            completion: Some(completion),
            cancels: Arc::clone(&cancels),
        });
        Box::new(cancels)
    }

    pub fn urls(&self) -> Vec<Url> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn cancels(&self, index: usize) -> usize {
        self.requests.lock().unwrap()[index].cancels.get()
    }

    pub fn complete(&self, index: usize, value: T) {
        let completion = self.requests.lock().unwrap()[index]
            .completion
            .take()
            .expect("request already completed");
        completion(value);
    }

    /// Drops the completion without calling it, as a cancelled task does
    pub fn drop_completion(&self, index: usize) {
        let completion = self.requests.lock().unwrap()[index].completion.take();
        drop(completion);
    }
}

/// HTTP client whose requests are completed by hand
#[derive(Default)]
pub struct HttpClientSpy {
    pub pending: Pending<HttpResult>,
}

impl HttpClientSpy {
    pub fn complete_with(&self, index: usize, status: u16, body: &[u8]) {
        let url = self.pending.urls()[index].clone();
        self.pending
            .complete(index, Ok((HttpResponse::new(url, status), body.to_vec())));
    }

    pub fn complete_with_error(&self, index: usize) {
        self.pending.complete(
            index,
            Err(HttpClientError::Connection("connection refused".to_string())),
        );
    }
}

impl HttpClient for HttpClientSpy {
    fn get(&self, url: &Url, completion: Completion<HttpResult>) -> TaskHandle {
        self.pending.record(url, completion)
    }
}

/// Loader whose loads are completed by hand
pub struct LoaderSpy<R> {
    pub pending: Pending<LoadResult<R>>,
}

impl<R> Default for LoaderSpy<R> {
    fn default() -> Self {
        Self {
            pending: Pending::default(),
        }
    }
}

impl<R: Send + 'static> Loader for LoaderSpy<R> {
    type Resource = R;

    fn load(&self, url: &Url, completion: Completion<LoadResult<R>>) -> TaskHandle {
        self.pending.record(url, completion)
    }
}

/// Loader that completes synchronously, inside `load`, with a fixed outcome
pub struct ImmediateLoader<R> {
    outcome: fn() -> LoadResult<R>,
    calls: AtomicUsize,
}

impl<R> ImmediateLoader<R> {
    pub fn new(outcome: fn() -> LoadResult<R>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<R: Send + 'static> Loader for ImmediateLoader<R> {
    type Resource = R;

    fn load(&self, _url: &Url, completion: Completion<LoadResult<R>>) -> TaskHandle {
        self.calls.fetch_add(1, Ordering::SeqCst);
        completion((self.outcome)());
        Box::new(Arc::new(CancelCount::default()))
    }
}

/// A completion that stores every value it receives
pub fn capture<T: Send + 'static>() -> (Completion<T>, Arc<Mutex<Vec<T>>>) {
    let received: Arc<Mutex<Vec<T>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let completion: Completion<T> = Box::new(move |value: T| sink.lock().unwrap().push(value));
    (completion, received)
}

pub fn any_url() -> Url {
    Url::parse("https://any-url.com").unwrap()
}

pub fn not_found<R>() -> LoadResult<R> {
    Err(LoadError::NotFound)
}

/// Polls `condition` until it holds, failing the test after a second
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}
