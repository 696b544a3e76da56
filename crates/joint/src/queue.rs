//! FIFO queue owned by the relay worker.

use std::collections::VecDeque;

// backing storage above this many slots is released once the queue drains
const RETAINED_SLOTS: usize = 64;

/// Unbounded FIFO queue with O(1) push at the tail and pop at the head.
///
/// Only the worker touches it, so there is no synchronization. Capping the
/// number of queued items is the worker's job, not the queue's.
#[derive(Debug)]
pub(crate) struct Queue<T> {
    items: VecDeque<T>,
}

impl<T> Queue<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Appends a value at the tail.
    #[inline]
    pub(crate) fn push(&mut self, value: T) {
        self.items.push_back(value);
    }

    /// Removes the head, or returns `None` if the queue is empty.
    #[inline]
    pub(crate) fn pop(&mut self) -> Option<T> {
        let value = self.items.pop_front();
        if self.items.is_empty() {
            self.release();
        }
        value
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every queued value.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.release();
    }

    // A burst under a large capacity should not pin its memory after the
    // capacity is lowered again.
    fn release(&mut self) {
        if self.items.capacity() > RETAINED_SLOTS {
            self.items.shrink_to(RETAINED_SLOTS);
        }
    }

    #[cfg(test)]
    fn allocated(&self) -> usize {
        self.items.capacity()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}
