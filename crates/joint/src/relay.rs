//! Relay construction and the control handle.

use crate::config::RelayConfig;
use crate::debug;
use crate::error::RelayError;
use crate::signal::{DoneSignal, Signals};
use crate::transport::Transport;
use arc_swap::ArcSwapOption;
use crossbeam_utils::CachePadded;
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Largest capacity a relay accepts. Also the initial, effectively
/// unbounded, capacity.
pub const MAX_CAPACITY: usize = usize::MAX - 1;

pub(crate) type FilterFn<T> = dyn Fn(&T) -> bool + Send + Sync;

/// Lifecycle of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RelayState {
    /// Nothing in flight; waiting on the source.
    Idle = 0,
    /// Items are queued or staged for the sink.
    Running = 1,
    /// The source closed; remaining items are being delivered.
    Draining = 2,
    /// The worker has exited. Terminal.
    Stopped = 3,
}

impl RelayState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// State shared between handles and the worker.
pub(crate) struct Shared<T> {
    /// Total capacity, including the native buffers of both channels.
    capacity: CachePadded<AtomicUsize>,
    /// Mirror of the worker's queued count.
    len: CachePadded<AtomicUsize>,
    state: AtomicU8,
    filter: ArcSwapOption<Box<FilterFn<T>>>,
    /// Combined buffer size of the source and sink channels.
    native: usize,
    pub(crate) signals: Arc<Signals>,
}

impl<T> Shared<T> {
    fn new(native: usize) -> Self {
        Self {
            capacity: CachePadded::new(AtomicUsize::new(MAX_CAPACITY)),
            len: CachePadded::new(AtomicUsize::new(0)),
            state: AtomicU8::new(RelayState::Idle as u8),
            filter: ArcSwapOption::empty(),
            native,
            signals: Arc::new(Signals::new()),
        }
    }

    fn min_capacity(&self) -> usize {
        self.native.saturating_add(1)
    }

    /// Validates a requested capacity and raises it to the minimum.
    fn clamp_capacity(&self, requested: usize) -> Result<usize, RelayError> {
        if requested > MAX_CAPACITY {
            return Err(RelayError::CapacityOverflow {
                requested,
                max: MAX_CAPACITY,
            });
        }
        let minimum = self.min_capacity();
        if requested < minimum {
            debug::capacity_raised(requested, minimum);
            return Ok(minimum);
        }
        Ok(requested)
    }

    /// Number of items the worker itself may hold.
    ///
    /// The channels' own buffers make up the rest of the capacity.
    #[inline]
    pub(crate) fn held_limit(&self) -> usize {
        self.capacity
            .load(Ordering::Acquire)
            .saturating_sub(self.native)
            .max(1)
    }

    /// Runs the active filter. No filter accepts everything.
    #[inline]
    pub(crate) fn accepts(&self, value: &T) -> bool {
        match self.filter.load().as_deref() {
            Some(filter) => filter(value),
            None => true,
        }
    }

    #[inline]
    pub(crate) fn publish(&self, queued: usize, state: RelayState) {
        self.len.store(queued, Ordering::Release);
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Handle to a running relay.
///
/// A relay moves every value received from a source channel into a sink
/// channel, buffering up to [`cap`](Relay::cap) values in flight. When the
/// limit is reached it stops receiving, so producers feel backpressure
/// through the source channel.
///
/// The relay ends in one of two ways:
///
/// - **Drain**: once every sender of the source is dropped, the relay
///   delivers everything it accepted and then stops.
/// - **Stop**: [`stop`](Relay::stop) ends it immediately; anything still
///   queued is dropped.
///
/// Dropping the handle does not stop the relay. Handles are cheap to clone
/// and every method takes `&self`, so they can be shared across tasks and
/// threads.
pub struct Relay<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Relay<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + fmt::Debug + 'static> Relay<T> {
    /// Starts relaying from `source` into `sink` with default configuration.
    ///
    /// Must be called from within a tokio runtime; the worker is spawned on
    /// it.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use joint::Relay;
    /// use tokio::sync::mpsc;
    ///
    /// let (tx, source) = mpsc::channel::<u64>(1);
    /// let (sink, mut rx) = mpsc::channel::<u64>(1);
    ///
    /// let relay = Relay::new(source, sink)?;
    /// relay.set_capacity(128)?;
    ///
    /// tx.send(7).await?;
    /// assert_eq!(rx.recv().await, Some(7));
    /// ```
    pub fn new(source: mpsc::Receiver<T>, sink: mpsc::Sender<T>) -> Result<Self, RelayError> {
        Self::with_config(source, sink, RelayConfig::default())
    }

    /// Starts relaying with a custom configuration.
    pub fn with_config(
        source: mpsc::Receiver<T>,
        sink: mpsc::Sender<T>,
        config: RelayConfig,
    ) -> Result<Self, RelayError> {
        if sink.is_closed() {
            return Err(RelayError::InvalidChannel);
        }
        let runtime = Handle::try_current().map_err(|_| RelayError::NoRuntime)?;

        let native = source.max_capacity().saturating_add(sink.max_capacity());
        let shared = Arc::new(Shared::new(native));
        if let Some(capacity) = config.capacity {
            let capacity = shared.clamp_capacity(capacity)?;
            shared.capacity.store(capacity, Ordering::Release);
        }

        let transport = Transport::new(
            source,
            sink,
            Arc::clone(&shared),
            config.effective_idle_interval(),
        );
        runtime.spawn(transport.run());
        tracing::trace!(target: "joint", native, "relay started");

        Ok(Self { shared })
    }
}

impl<T> Relay<T> {
    /// Installs a filter. Values for which it returns `false` are dropped.
    ///
    /// Replaces any previous filter and applies from the next value the
    /// relay handles, including values already queued.
    pub fn set_filter<F>(&self, filter: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let filter: Box<FilterFn<T>> = Box::new(filter);
        self.shared.filter.store(Some(Arc::new(filter)));
    }

    /// Removes the filter.
    pub fn clear_filter(&self) {
        self.shared.filter.store(None);
    }

    /// Changes the capacity while the relay runs.
    ///
    /// Values below [`min_capacity`](Relay::min_capacity) are raised to it.
    /// Fails with [`RelayError::CapacityOverflow`] above [`MAX_CAPACITY`],
    /// leaving the previous capacity in effect. A worker held back by the
    /// old capacity picks up the new one immediately.
    pub fn set_capacity(&self, capacity: usize) -> Result<(), RelayError> {
        let capacity = self.shared.clamp_capacity(capacity)?;
        let previous = self.shared.capacity.swap(capacity, Ordering::AcqRel);
        if previous != capacity && !self.is_stopped() {
            self.shared.signals.request_reload();
        }
        Ok(())
    }

    /// Number of values currently held by the relay.
    pub fn len(&self) -> usize {
        self.shared.len.load(Ordering::Acquire)
    }

    /// Returns `true` if the relay holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current capacity.
    pub fn cap(&self) -> usize {
        self.shared.capacity.load(Ordering::Acquire)
    }

    /// Smallest capacity the relay accepts: both channel buffers plus one.
    pub fn min_capacity(&self) -> usize {
        self.shared.min_capacity()
    }

    /// Stops the relay immediately, dropping any values still held.
    ///
    /// Idempotent. Returns `true` only for the call that triggered the stop.
    pub fn stop(&self) -> bool {
        let first = self.shared.signals.cancel.set();
        if first {
            tracing::trace!(target: "joint", "stop requested");
        }
        first
    }

    /// Returns `true` once a stop was requested or the worker has exited.
    pub fn is_stopped(&self) -> bool {
        self.shared.signals.cancel.is_set()
    }

    /// Returns the lifecycle state last published by the worker.
    pub fn state(&self) -> RelayState {
        RelayState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Returns a handle that observes completion.
    pub fn done(&self) -> DoneSignal {
        DoneSignal::new(Arc::clone(&self.shared.signals))
    }

    /// Waits until the worker has exited, by draining or by [`stop`](Relay::stop).
    pub async fn wait(&self) {
        self.shared.signals.done.wait().await;
    }
}

impl<T> fmt::Debug for Relay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("len", &self.len())
            .field("cap", &self.cap())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
