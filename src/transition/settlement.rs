//! Single-assignment result slots observed by any number of waiters.

use super::error::{TransitionError, TransitionResult};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Future resolving to a settled outcome. Cloning is cheap; every clone
/// yields the same value.
pub type Settlement<T> = Shared<BoxFuture<'static, TransitionResult<T>>>;

/// A result slot written exactly once.
///
/// Later writes are ignored and reported as `false`. If the slot is dropped
/// without being written, waiters observe [`TransitionError::Dropped`].
pub(crate) struct Deferred<T: Clone> {
    sender: Mutex<Option<oneshot::Sender<TransitionResult<T>>>>,
    settled: Mutex<Option<TransitionResult<T>>>,
    outcome: Settlement<T>,
}

impl<T> Deferred<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        let outcome = async move { receiver.await.unwrap_or(Err(TransitionError::Dropped)) }
            .boxed()
            .shared();
        Self {
            sender: Mutex::new(Some(sender)),
            settled: Mutex::new(None),
            outcome,
        }
    }

    /// Write the slot. Returns `false` if it was already settled.
    pub(crate) fn settle(&self, result: TransitionResult<T>) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            return false;
        };
        *self.settled.lock() = Some(result.clone());
        // Nobody listening is fine: the copy above still answers `peek`.
        let _ = sender.send(result);
        true
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Settled value, without waiting.
    pub(crate) fn peek(&self) -> Option<TransitionResult<T>> {
        self.settled.lock().clone()
    }

    pub(crate) fn outcome(&self) -> Settlement<T> {
        self.outcome.clone()
    }
}
