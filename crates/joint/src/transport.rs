//! The relay worker.
//!
//! A single task per relay owns the queue, the staged item and the
//! source-closed flag. Handles reach it only through [`Shared`].

use crate::debug;
use crate::invariants::debug_assert_completed_once;
#[cfg(debug_assertions)]
use crate::invariants::{
    debug_assert_queue_accounting, debug_assert_room_to_accept, debug_assert_staged_iff_nonempty,
};
use crate::queue::Queue;
use crate::relay::{RelayState, Shared};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// What woke the worker up.
enum Wake<T> {
    Cancelled,
    Reload,
    Idle,
    Received(Option<T>),
    Sent,
    SinkClosed,
}

pub(crate) struct Transport<T> {
    source: mpsc::Receiver<T>,
    sink: mpsc::Sender<T>,
    shared: Arc<Shared<T>>,
    queue: Queue<T>,
    /// Next value to send. Present exactly when `queue_size > 0`.
    staged: Option<T>,
    /// Values held: `queue.len()` plus the staged one.
    queue_size: usize,
    source_closed: bool,
    idle_interval: Duration,
}

impl<T: Send + Debug + 'static> Transport<T> {
    pub(crate) fn new(
        source: mpsc::Receiver<T>,
        sink: mpsc::Sender<T>,
        shared: Arc<Shared<T>>,
        idle_interval: Duration,
    ) -> Self {
        Self {
            source,
            sink,
            shared,
            queue: Queue::new(),
            staged: None,
            queue_size: 0,
            source_closed: false,
            idle_interval,
        }
    }

    /// Moves values from source to sink until the source is drained or the
    /// relay is stopped.
    pub(crate) async fn run(mut self) {
        // Fires completion even if a user filter panics.
        let _exit = ExitGuard {
            shared: Arc::clone(&self.shared),
        };

        loop {
            let wake = if self.queue_size == 0 {
                if self.source_closed {
                    break;
                }
                self.wait_empty().await
            } else {
                self.wait_loaded().await
            };

            match wake {
                Wake::Cancelled => {
                    debug::exited(self.queue_size);
                    self.discard();
                    break;
                }
                Wake::Reload | Wake::Idle => {}
                Wake::Received(Some(value)) => self.accept(value),
                Wake::Received(None) => {
                    self.source_closed = true;
                    debug::source_closed(self.queue_size);
                }
                Wake::Sent => self.advance(),
                Wake::SinkClosed => {
                    tracing::warn!(
                        target: "joint",
                        discarded = self.queue_size,
                        "sink closed while relaying; stopping"
                    );
                    self.discard();
                    break;
                }
            }

            #[cfg(debug_assertions)]
            {
                debug_assert_queue_accounting!(
                    self.queue_size,
                    self.queue.len(),
                    self.staged.is_some()
                );
                debug_assert_staged_iff_nonempty!(self.queue_size, self.staged.is_some());
            }
            self.publish();
        }

        if self.source_closed && self.queue_size == 0 {
            debug::exited(0);
        }
    }

    /// Nothing in flight: wait for a value, a stop or a capacity change.
    async fn wait_empty(&mut self) -> Wake<T> {
        let signals = &self.shared.signals;
        tokio::select! {
            biased;
            () = signals.cancel.wait() => Wake::Cancelled,
            () = signals.reload.notified() => Wake::Reload,
            received = self.source.recv() => Wake::Received(received),
            () = sleep(self.idle_interval) => Wake::Idle,
        }
    }

    /// A value is staged: offer it to the sink, and keep receiving unless
    /// the relay is full or the source is gone.
    async fn wait_loaded(&mut self) -> Wake<T> {
        let limit = self.shared.held_limit();
        let receiving = !self.source_closed && self.queue_size < limit;
        let signals = &self.shared.signals;

        let wake = tokio::select! {
            biased;
            () = signals.cancel.wait() => Wake::Cancelled,
            () = signals.reload.notified() => Wake::Reload,
            permit = self.sink.reserve() => match permit {
                Ok(permit) => {
                    if let Some(value) = self.staged.take() {
                        debug::dequeue(&value);
                        permit.send(value);
                    }
                    Wake::Sent
                }
                Err(_) => Wake::SinkClosed,
            },
            received = self.source.recv(), if receiving => Wake::Received(received),
            () = sleep(self.idle_interval) => Wake::Idle,
        };

        #[cfg(debug_assertions)]
        if let Wake::Received(Some(_)) = wake {
            debug_assert_room_to_accept!(self.queue_size, limit);
        }
        wake
    }

    /// Takes in a value from the source.
    fn accept(&mut self, value: T) {
        if !self.shared.accepts(&value) {
            return;
        }
        debug::enqueue(&value);
        if self.staged.is_none() {
            debug_assert!(self.queue.is_empty());
            self.staged = Some(value);
        } else {
            self.queue.push(value);
        }
        self.queue_size += 1;
    }

    /// The staged value was sent: stage the next one that passes the filter.
    fn advance(&mut self) {
        self.queue_size -= 1;
        while self.queue_size > 0 {
            let Some(value) = self.queue.pop() else {
                // Accounting is checked after every iteration; recover in
                // release builds rather than stall.
                self.queue_size = 0;
                break;
            };
            if self.shared.accepts(&value) {
                self.staged = Some(value);
                break;
            }
            self.queue_size -= 1;
        }
    }

    fn discard(&mut self) {
        self.staged = None;
        self.queue.clear();
        self.queue_size = 0;
    }

    fn publish(&self) {
        let state = if self.queue_size == 0 {
            RelayState::Idle
        } else if self.source_closed {
            RelayState::Draining
        } else {
            RelayState::Running
        };
        self.shared.publish(self.queue_size, state);
    }
}

/// Marks the relay stopped when the worker ends, however it ends.
struct ExitGuard<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Drop for ExitGuard<T> {
    fn drop(&mut self) {
        self.shared.publish(0, RelayState::Stopped);
        // Late `set_capacity` calls see the relay as stopped and skip the
        // reload hint.
        self.shared.signals.cancel.set();
        let first = self.shared.signals.done.set();
        debug_assert_completed_once!(first);
    }
}
