//! Process-wide instrumentation toggle.
//!
//! When enabled, every value entering or leaving a relay's queue is logged
//! through `tracing` at `DEBUG` level under the `joint` target, together with
//! a few lifecycle events. The toggle is read before each event and never
//! influences what the relay does.
//!
//! Call [`init_from_env`] (or [`set_enabled`]) once at program start.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// Environment variable read by [`init_from_env`].
pub const ENV_VAR: &str = "JOINT_DEBUG";

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Turns instrumentation on or off for every relay in the process.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

/// Returns `true` if instrumentation is on.
#[inline]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Sets the toggle from `JOINT_DEBUG` (`1`, `true`, `on` or `yes`).
///
/// Returns the resulting state. An unset or unrecognized value turns
/// instrumentation off.
pub fn init_from_env() -> bool {
    let enabled = std::env::var(ENV_VAR).is_ok_and(|value| parse_flag(&value));
    set_enabled(enabled);
    enabled
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

#[inline]
pub(crate) fn enqueue<T: Debug>(value: &T) {
    if is_enabled() {
        tracing::debug!(target: "joint", ?value, "enqueue");
    }
}

#[inline]
pub(crate) fn dequeue<T: Debug>(value: &T) {
    if is_enabled() {
        tracing::debug!(target: "joint", ?value, "dequeue");
    }
}

pub(crate) fn capacity_raised(requested: usize, minimum: usize) {
    if is_enabled() {
        tracing::debug!(target: "joint", requested, minimum, "capacity raised to minimum");
    }
}

pub(crate) fn source_closed(queued: usize) {
    if is_enabled() {
        tracing::debug!(target: "joint", queued, "source closed");
    }
}

pub(crate) fn exited(discarded: usize) {
    if is_enabled() {
        tracing::debug!(target: "joint", discarded, "relay exited");
    }
}
