//! Cancellable task handles
//!
//! Every asynchronous operation in this crate takes a one-shot completion
//! callback and hands back a [`TaskHandle`]. Cancelling the handle drops the
//! stored callback before anything else happens, so a cancelled operation
//! never reports back, even if the work underneath finishes later.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One-shot callback receiving the outcome of an asynchronous operation
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Handle returned by every asynchronous operation
pub type TaskHandle = Box<dyn Cancellable>;

/// Something in flight that can be told to stop
pub trait Cancellable: Send + Sync {
    /// Stops the operation. After this returns the operation's completion
    /// callback will not be invoked.
    fn cancel(&self);
}

impl<C: Cancellable + ?Sized> Cancellable for Arc<C> {
    fn cancel(&self) {
        (**self).cancel()
    }
}

/// Cancels a task spawned on a tokio runtime
#[derive(Debug)]
pub struct SpawnedTask(tokio::task::AbortHandle);

impl SpawnedTask {
    pub fn new(handle: tokio::task::AbortHandle) -> Self {
        Self(handle)
    }
}

impl Cancellable for SpawnedTask {
    fn cancel(&self) {
        self.0.abort();
    }
}

struct State<T> {
    completion: Option<Completion<T>>,
    inner: Option<TaskHandle>,
    cancelled: bool,
}

/// Owns a completion callback and the lower-level task producing its value.
///
/// Delivery and cancellation both take the callback out under the same lock;
/// whichever gets there first wins and the loser becomes a no-op. The
/// callback is always invoked (or dropped) after the lock is released.
pub struct TaskWrapper<T> {
    state: Mutex<State<T>>,
}

impl<T> TaskWrapper<T> {
    /// Wraps `completion`, returning a shared handle so the producing side
    /// and the caller's cancel handle can both reach it.
    pub fn new(completion: Completion<T>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                completion: Some(completion),
                inner: None,
                cancelled: false,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers `value` unless the task was cancelled or already completed.
    pub fn complete(&self, value: T) {
        let completion = self.lock().completion.take();
        if let Some(completion) = completion {
            completion(value);
        }
    }

    /// Whether `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Records the lower-level task, unless one is already recorded.
    ///
    /// A task that completed synchronously may have swapped in a follow-up
    /// task before the first one was attached; the follow-up stays. If the
    /// wrapper is already cancelled the task is cancelled immediately.
    pub fn attach(&self, task: TaskHandle) {
        let mut state = self.lock();
        if state.cancelled {
            drop(state);
            task.cancel();
        } else if state.inner.is_none() {
            state.inner = Some(task);
        }
    }

    /// Replaces the lower-level task, e.g. when switching to a fallback.
    pub fn replace(&self, task: TaskHandle) {
        let mut state = self.lock();
        if state.cancelled {
            drop(state);
            task.cancel();
        } else {
            state.inner = Some(task);
        }
    }
}

impl<T> Cancellable for TaskWrapper<T> {
    fn cancel(&self) {
        let (completion, inner) = {
            let mut state = self.lock();
            state.cancelled = true;
            (state.completion.take(), state.inner.take())
        };
        drop(completion);
        if let Some(inner) = inner {
            inner.cancel();
        }
    }
}
