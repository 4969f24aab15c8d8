//! Future and stream adapters over the callback contract

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::IntoStream;
use futures::FutureExt;
use url::Url;

use super::{LoadResult, Loader};
use crate::task::TaskHandle;

enum State<R> {
    Idle,
    Running {
        receiver: oneshot::Receiver<LoadResult<R>>,
        task: TaskHandle,
    },
    Finished,
}

/// A load that starts on first poll and resolves to its single outcome
///
/// Nothing happens until the future is polled. Dropping it while the load is
/// in flight cancels the underlying task once. If the underlying task is
/// cancelled some other way it never reports, and neither does this future.
pub struct LoadFuture<L: Loader> {
    loader: L,
    url: Url,
    state: State<L::Resource>,
}

impl<L: Loader> LoadFuture<L> {
    pub fn new(loader: L, url: Url) -> Self {
        Self {
            loader,
            url,
            state: State::Idle,
        }
    }
}

impl<L: Loader + Unpin> Future for LoadFuture<L> {
    type Output = LoadResult<L::Resource>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                State::Idle => {
                    let (sender, receiver) = oneshot::channel();
                    let task = this.loader.load(
                        &this.url,
                        Box::new(move |result| {
                            let _ = sender.send(result);
                        }),
                    );
                    this.state = State::Running { receiver, task };
                }
                State::Running { receiver, .. } => {
                    return match Pin::new(receiver).poll(cx) {
                        Poll::Ready(Ok(result)) => {
                            this.state = State::Finished;
                            Poll::Ready(result)
                        }
                        // Completion dropped unsent: the task was cancelled
                        Poll::Ready(Err(oneshot::Canceled)) => Poll::Pending,
                        Poll::Pending => Poll::Pending,
                    };
                }
                State::Finished => panic!("LoadFuture polled after completion"),
            }
        }
    }
}

impl<L: Loader> Drop for LoadFuture<L> {
    fn drop(&mut self) {
        if let State::Running { task, .. } = std::mem::replace(&mut self.state, State::Finished) {
            task.cancel();
        }
    }
}

/// Future and stream entry points for every [`Loader`]
///
/// Cancellation is not an outcome. If the task behind a load is cancelled by
/// anything other than dropping the future or stream, its completion is
/// dropped unsent: the future stays pending forever and the stream never
/// yields. Callers that cancel out of band should also drop the future, or
/// put a timeout around it.
pub trait LoaderExt: Loader {
    /// A cold future for one load of `url`
    ///
    /// Resolves once with the load's result, or never if the load is
    /// cancelled elsewhere.
    fn load_future(&self, url: Url) -> LoadFuture<&Self> {
        LoadFuture::new(self, url)
    }

    /// A cold stream yielding the outcome of one load of `url`, then ending
    ///
    /// Yields nothing, and never ends, if the load is cancelled elsewhere.
    fn load_stream(&self, url: Url) -> IntoStream<LoadFuture<&Self>> {
        self.load_future(url).into_stream()
    }
}

impl<L: Loader + ?Sized> LoaderExt for L {}
