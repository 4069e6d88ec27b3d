//! Batch draining for [`BoundedQueue`]
//!
//! Moves up to `max_items` items out of the queue under a single lock
//! acquisition, which is what the engine workers use to cut per-record
//! lock traffic.

use super::queue::{BoundedQueue, QueueState};
use std::time::{Duration, Instant};

impl<T> BoundedQueue<T> {
    /// Move up to `max` items from the front of `state` into `out`.
    fn drain_into(state: &mut QueueState<T>, out: &mut Vec<T>, max: usize) -> usize {
        let count = max.max(1).min(state.items.len());
        out.reserve(count);
        out.extend(state.items.drain(..count));
        count
    }

    fn after_drain(&self, count: usize) -> usize {
        if count > 0 {
            self.not_full.notify_all();
        }
        count
    }

    /// Block until at least one item is queued (or shutdown), then append
    /// up to `max_items` items to `out` in FIFO order.
    ///
    /// Returns the number of items moved. `0` means the queue is shut down
    /// and empty. A `max_items` of `0` is treated as `1`.
    pub fn pop_batch(&self, out: &mut Vec<T>, max_items: usize) -> usize {
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.shutdown {
            self.not_empty.wait(&mut state);
        }
        let count = Self::drain_into(&mut state, out, max_items);
        drop(state);
        self.after_drain(count)
    }

    /// Like [`pop_batch`](Self::pop_batch) but gives up after `timeout`.
    pub fn pop_batch_timeout(&self, out: &mut Vec<T>, max_items: usize, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.shutdown {
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        let count = Self::drain_into(&mut state, out, max_items);
        drop(state);
        self.after_drain(count)
    }

    /// Append up to `max_items` items to `out` without waiting.
    pub fn try_pop_batch(&self, out: &mut Vec<T>, max_items: usize) -> usize {
        let mut state = self.state.lock();
        let count = Self::drain_into(&mut state, out, max_items);
        drop(state);
        self.after_drain(count)
    }
}
