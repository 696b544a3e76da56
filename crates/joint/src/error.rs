//! Error types for relay operations.

use thiserror::Error;

/// Errors that can occur when building or reconfiguring a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The sink's receiving half was already dropped.
    #[error("sink channel is closed")]
    InvalidChannel,

    /// Construction happened outside a tokio runtime.
    #[error("no tokio runtime available to spawn the relay worker")]
    NoRuntime,

    /// The requested capacity cannot be represented.
    #[error("capacity {requested} exceeds maximum {max}")]
    CapacityOverflow {
        /// The capacity that was asked for.
        requested: usize,
        /// The largest capacity a relay accepts.
        max: usize,
    },
}

impl RelayError {
    /// Returns `true` if the relay is still usable after this error.
    ///
    /// A rejected capacity leaves the previous one in effect.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CapacityOverflow { .. })
    }

    /// Returns `true` if the error was raised while constructing the relay.
    #[inline]
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::InvalidChannel | Self::NoRuntime)
    }
}
