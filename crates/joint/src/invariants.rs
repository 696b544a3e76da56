//! Debug assertion macros for relay invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.

// =============================================================================
// Queue accounting
// =============================================================================

/// Assert that the queued count matches what the worker actually holds.
///
/// **Invariant**: `queue_size == queue.len() + staged`
///
/// Used in: `Transport::run()` after every iteration
macro_rules! debug_assert_queue_accounting {
    ($queue_size:expr, $queued:expr, $staged:expr) => {
        debug_assert!(
            $queue_size == $queued + usize::from($staged),
            "queue accounting broken: queue_size {} but {} queued and staged={}",
            $queue_size,
            $queued,
            $staged
        )
    };
}

/// Assert that an item is staged exactly when the queue is non-empty.
///
/// **Invariant**: `queue_size > 0 ⇔ staged.is_some()`
macro_rules! debug_assert_staged_iff_nonempty {
    ($queue_size:expr, $staged:expr) => {
        debug_assert!(
            ($queue_size > 0) == $staged,
            "staging broken: queue_size {} but staged={}",
            $queue_size,
            $staged
        )
    };
}

// =============================================================================
// Capacity
// =============================================================================

/// Assert that accepting one more item keeps the queue within its limit.
///
/// **Invariant**: `accept → queue_size < held capacity`
///
/// The limit may drop below `queue_size` when capacity is lowered at
/// runtime; the worker then stops accepting until it has drained below it,
/// so the check applies only at the moment an item is accepted.
macro_rules! debug_assert_room_to_accept {
    ($queue_size:expr, $limit:expr) => {
        debug_assert!(
            $queue_size < $limit,
            "capacity exceeded: accepting with queue_size {} at limit {}",
            $queue_size,
            $limit
        )
    };
}

// =============================================================================
// Completion
// =============================================================================

/// Assert that completion fired exactly once.
///
/// **Invariant**: `worker exit → done.set() returns true`
macro_rules! debug_assert_completed_once {
    ($first:expr) => {
        debug_assert!($first, "completion signal fired more than once")
    };
}

pub(crate) use debug_assert_completed_once;
pub(crate) use debug_assert_queue_accounting;
pub(crate) use debug_assert_room_to_accept;
pub(crate) use debug_assert_staged_iff_nonempty;
