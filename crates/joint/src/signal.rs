//! Control signals shared between relay handles and the worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// One-shot flag that any number of tasks can await.
///
/// Setting it is first-caller-wins; every waiter, including ones that
/// arrive after it was set, resolves.
#[derive(Debug, Default)]
pub(crate) struct Latch {
    set: AtomicBool,
    notify: Notify,
}

impl Latch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the latch. Returns `true` only for the call that set it.
    pub(crate) fn set(&self) -> bool {
        if self.set.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.notify.notify_waiters();
        true
    }

    #[inline]
    pub(crate) fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Resolves once the latch is set.
    pub(crate) async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent `set` cannot slip
            // between the check and the await.
            notified.as_mut().enable();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

/// Signals used to steer a running worker.
#[derive(Debug, Default)]
pub(crate) struct Signals {
    /// Set by `Relay::stop` and by the worker on its own exit.
    pub(crate) cancel: Latch,
    /// Set by the worker once it has exited.
    pub(crate) done: Latch,
    /// Capacity changed; the worker re-reads it on wakeup.
    pub(crate) reload: Notify,
}

impl Signals {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Latch::new(),
            done: Latch::new(),
            reload: Notify::new(),
        }
    }

    /// Wakes the worker so it re-reads the capacity.
    ///
    /// `Notify` keeps at most one stored permit, so a burst of requests
    /// collapses into a single wakeup.
    #[inline]
    pub(crate) fn request_reload(&self) {
        self.reload.notify_one();
    }
}

/// A cloneable handle that observes relay completion.
///
/// Completion fires exactly once, after the worker has stopped, whether it
/// drained a closed source or was cancelled.
#[derive(Debug, Clone)]
pub struct DoneSignal {
    signals: Arc<Signals>,
}

impl DoneSignal {
    pub(crate) fn new(signals: Arc<Signals>) -> Self {
        Self { signals }
    }

    /// Returns `true` if the relay has stopped.
    pub fn is_done(&self) -> bool {
        self.signals.done.is_set()
    }

    /// Waits until the relay has stopped.
    ///
    /// Any number of tasks may wait concurrently; all of them resolve.
    pub async fn wait(&self) {
        self.signals.done.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_latch_first_caller_wins() {
        let latch = Latch::new();
        assert!(!latch.is_set());
        assert!(latch.set());
        assert!(!latch.set());
        assert!(latch.is_set());
    }

    #[tokio::test]
    async fn test_latch_wakes_all_waiters() {
        let latch = Arc::new(Latch::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let latch = Arc::clone(&latch);
                tokio::spawn(async move { latch.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        latch.set();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter not woken")
                .expect("waiter panicked");
        }
    }

    #[tokio::test]
    async fn test_latch_wait_after_set() {
        let latch = Latch::new();
        latch.set();
        tokio::time::timeout(Duration::from_millis(100), latch.wait())
            .await
            .expect("set latch should resolve immediately");
    }

    #[tokio::test]
    async fn test_reload_requests_coalesce() {
        let signals = Signals::new();
        signals.request_reload();
        signals.request_reload();
        signals.request_reload();

        // One stored permit, no matter how many requests.
        tokio::time::timeout(Duration::from_millis(50), signals.reload.notified())
            .await
            .expect("first wakeup should be immediate");
        let second =
            tokio::time::timeout(Duration::from_millis(50), signals.reload.notified()).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_done_signal() {
        let signals = Arc::new(Signals::new());
        let done = DoneSignal::new(Arc::clone(&signals));
        let clone = done.clone();
        assert!(!done.is_done());

        signals.done.set();
        done.wait().await;
        assert!(clone.is_done());
    }
}
