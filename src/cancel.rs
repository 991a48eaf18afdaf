//! Cooperative cancellation for async pagination.
//!
//! A [`CancelSignal`] is consulted right before every fetch. If it's already active the fetch is not
//! started and `advance` returns `false`. Signals that can also be awaited (like [`CancelToken`])
//! additionally abort a fetch that is already in flight.

use futures::{
    channel::oneshot,
    future::{self, FutureExt, Shared},
};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
};

/// Something that tells an async paged iterator to stop.
pub trait CancelSignal: Sync {
    /// Whether cancellation was requested.
    fn is_cancelled(&self) -> bool;

    /// Resolves once cancellation is requested.
    ///
    /// The default never resolves, which means an in-flight fetch always runs to completion and
    /// its page is applied. Override it to abort in-flight fetches.
    fn cancelled(&self) -> impl Send + Future<Output = ()> {
        future::pending()
    }
}

/// Never cancelled. Use `&()` when you don't need cancellation.
impl CancelSignal for () {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancelSignal for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<C> CancelSignal for &C
where
    C: ?Sized + CancelSignal,
{
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }

    fn cancelled(&self) -> impl Send + Future<Output = ()> {
        (**self).cancelled()
    }
}

impl<C> CancelSignal for Arc<C>
where
    C: ?Sized + CancelSignal + Send,
{
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }

    fn cancelled(&self) -> impl Send + Future<Output = ()> {
        (**self).cancelled()
    }
}

/// A clonable cancellation flag that can also be awaited.
///
/// All clones observe the same state. Cancelling is permanent.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<oneshot::Sender<()>>>,
    fired: Shared<oneshot::Receiver<()>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, fired) = oneshot::channel();

        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                fired: fired.shared(),
            }),
        }
    }

    /// Requests cancellation and wakes everyone awaiting [`CancelSignal::cancelled`].
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);

        let trigger = self
            .inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(trigger) = trigger {
            // Receivers are owned by `self`, the send can't fail.
            let _ = trigger.send(());
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelSignal for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    fn cancelled(&self) -> impl Send + Future<Output = ()> {
        let fired = self.inner.fired.clone();

        async move {
            // The sender lives as long as the token, a closed channel means nothing will ever fire.
            if fired.await.is_err() {
                future::pending::<()>().await;
            }
        }
    }
}
