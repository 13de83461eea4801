// Legacy callback compatibility
// One future-returning operation drives both the awaited result and an optional error-first callback

use crate::error::{BridgeError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// Error-first callback: `(Some(error), None)` or `(None, Some(value))`.
pub type Callback<T> = Box<dyn FnOnce(Option<BridgeError>, Option<T>) + Send>;

/// Callback for operations without a result value.
pub type ErrorCallback = Box<dyn FnOnce(Option<BridgeError>) + Send>;

/// Box a closure as a [`Callback`].
pub fn callback<T, F>(f: F) -> Callback<T>
where
    F: FnOnce(Option<BridgeError>, Option<T>) + Send + 'static,
{
    Box::new(f)
}

/// Box a closure as an [`ErrorCallback`].
pub fn error_callback<F>(f: F) -> ErrorCallback
where
    F: FnOnce(Option<BridgeError>) + Send + 'static,
{
    Box::new(f)
}

/// Await `op` once, hand its outcome to `callback` if there is one, and return it.
pub async fn with_callback<T, Fut>(op: Fut, callback: Option<Callback<T>>) -> Result<T>
where
    T: Clone,
    Fut: Future<Output = Result<T>>,
{
    let outcome = op.await;
    if let Some(callback) = callback {
        match &outcome {
            Ok(value) => callback(None, Some(value.clone())),
            Err(error) => callback(Some(error.clone()), None),
        }
    }
    outcome
}

/// [`with_callback`] for operations whose callback only reports failure.
pub async fn with_error_callback<Fut>(op: Fut, callback: Option<ErrorCallback>) -> Result<()>
where
    Fut: Future<Output = Result<()>>,
{
    let outcome = op.await;
    if let Some(callback) = callback {
        callback(outcome.as_ref().err().cloned());
    }
    outcome
}

/// Run `op` on the runtime right away, driving `callback` when it finishes.
///
/// The returned handle may be awaited for the same outcome or dropped; the
/// callback fires either way.
pub fn spawn<T, Fut>(op: Fut, callback: Option<Callback<T>>) -> CallbackPromise<T>
where
    T: Clone + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    CallbackPromise {
        handle: tokio::spawn(with_callback(op, callback)),
    }
}

/// [`spawn`] for operations with an [`ErrorCallback`].
pub fn spawn_with_error_callback<Fut>(
    op: Fut,
    callback: Option<ErrorCallback>,
) -> CallbackPromise<()>
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    CallbackPromise {
        handle: tokio::spawn(with_error_callback(op, callback)),
    }
}

/// Handle to an eagerly running operation; resolves to its outcome.
#[derive(Debug)]
pub struct CallbackPromise<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T> CallbackPromise<T> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for CallbackPromise<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(e) => Err(BridgeError::Internal(format!("operation task failed: {}", e))),
        })
    }
}
