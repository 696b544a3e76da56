//! Configuration for relay behavior.

use std::time::Duration;

/// Shortest heartbeat interval the worker uses. Shorter intervals, including
/// zero, are raised to it.
pub const MIN_IDLE_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration applied when a relay is constructed.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Heartbeat interval of the worker.
    ///
    /// The worker wakes up at least this often even when nothing happens on
    /// either channel. A wakeup only re-evaluates state; it never times out
    /// a send or receive.
    ///
    /// Values below [`MIN_IDLE_INTERVAL`] are raised to it.
    ///
    /// Default: 1 hour
    pub idle_interval: Duration,

    /// Initial capacity.
    ///
    /// `None` leaves the relay effectively unbounded. Values below the
    /// minimum are raised to it, exactly as `Relay::set_capacity` does.
    ///
    /// Default: `None`
    pub capacity: Option<usize>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_secs(60 * 60),
            capacity: None,
        }
    }
}

impl RelayConfig {
    /// Creates a configuration that starts with the given capacity.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Sets the heartbeat interval, raised to [`MIN_IDLE_INTERVAL`] if shorter.
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval.max(MIN_IDLE_INTERVAL);
        self
    }

    /// Sets the initial capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Heartbeat interval with the floor applied.
    pub(crate) fn effective_idle_interval(&self) -> Duration {
        self.idle_interval.max(MIN_IDLE_INTERVAL)
    }
}
