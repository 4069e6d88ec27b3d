//! Thread-safe bounded FIFO queue
//!
//! One mutex guards the buffer and the shutdown flag. Two condition
//! variables wake consumers (`not_empty`) and producers (`not_full`).
//! Batch draining lives in [`super::batch`].

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Reason a push was rejected. The rejected item is handed back.
#[derive(PartialEq, Eq)]
pub enum PushError<T> {
    /// Queue is at capacity
    Full(T),
    /// Queue has been shut down
    Shutdown(T),
}

impl<T> PushError<T> {
    /// Recover the item that could not be stored
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item) | PushError::Shutdown(item) => item,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, PushError::Full(_))
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, PushError::Shutdown(_))
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => f.write_str("Full(..)"),
            PushError::Shutdown(_) => f.write_str("Shutdown(..)"),
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => f.write_str("queue is full"),
            PushError::Shutdown(_) => f.write_str("queue is shut down"),
        }
    }
}

impl<T> std::error::Error for PushError<T> {}

pub(crate) struct QueueState<T> {
    pub(crate) items: VecDeque<T>,
    pub(crate) shutdown: bool,
}

/// Bounded multi-producer multi-consumer queue.
///
/// A capacity of `0` means unbounded. Once [`shutdown`](Self::shutdown) is
/// called no push succeeds again, while pops keep succeeding until the
/// buffer is empty.
pub struct BoundedQueue<T> {
    pub(crate) state: Mutex<QueueState<T>>,
    pub(crate) not_empty: Condvar,
    pub(crate) not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let initial = if capacity == 0 { 64 } else { capacity.min(4096) };
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(initial),
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    #[inline]
    pub(crate) fn is_at_capacity(&self, len: usize) -> bool {
        self.capacity > 0 && len >= self.capacity
    }

    /// Push, waiting for space while the queue is full.
    ///
    /// Fails only when the queue is (or becomes) shut down before the item
    /// could be stored.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        let mut state = self.state.lock();
        while !state.shutdown && self.is_at_capacity(state.items.len()) {
            self.not_full.wait(&mut state);
        }
        if state.shutdown {
            return Err(PushError::Shutdown(item));
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Push without waiting. This is the drop-on-full path.
    pub fn try_push(&self, item: T) -> Result<(), PushError<T>> {
        let mut state = self.state.lock();
        if state.shutdown {
            return Err(PushError::Shutdown(item));
        }
        if self.is_at_capacity(state.items.len()) {
            return Err(PushError::Full(item));
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pop, waiting for an item. Returns `None` once shut down and empty.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.shutdown {
            self.not_empty.wait(&mut state);
        }
        let item = state.items.pop_front();
        drop(state);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Pop, waiting at most `timeout`. Returns `None` on timeout or when
    /// shut down and empty.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.shutdown {
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        let item = state.items.pop_front();
        drop(state);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Pop without waiting.
    pub fn try_pop(&self) -> Option<T> {
        let item = self.state.lock().items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Enter the terminal shutdown state and wake every waiter. Idempotent.
    pub fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Discard every queued item and wake blocked producers.
    pub fn clear(&self) -> usize {
        let discarded = {
            let mut state = self.state.lock();
            let n = state.items.len();
            state.items.clear();
            n
        };
        self.not_full.notify_all();
        discarded
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Always `false` for an unbounded queue.
    pub fn is_full(&self) -> bool {
        if self.capacity == 0 {
            return false;
        }
        self.is_at_capacity(self.state.lock().items.len())
    }

    /// Configured capacity, `0` when unbounded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedQueue")
            .field("len", &state.items.len())
            .field("capacity", &self.capacity)
            .field("shutdown", &state.shutdown)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::unbounded();
        for i in 0..10 {
            queue.push(i).unwrap();
        }
        let drained: Vec<_> = std::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(drained, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_try_push_full() {
        let queue = BoundedQueue::new(2);
        assert!(queue.try_push("a").is_ok());
        assert!(queue.try_push("b").is_ok());
        assert!(queue.is_full());

        let err = queue.try_push("c").unwrap_err();
        assert!(err.is_full());
        assert_eq!(err.into_inner(), "c");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_unbounded_never_full() {
        let queue = BoundedQueue::unbounded();
        for i in 0..10_000 {
            queue.try_push(i).unwrap();
        }
        assert!(!queue.is_full());
        assert_eq!(queue.capacity(), 0);
        assert_eq!(queue.len(), 10_000);
    }

    #[test]
    fn test_shutdown_drains_then_closes() {
        let queue = BoundedQueue::new(8);
        for i in 0..5 {
            queue.push(i).unwrap();
        }
        queue.shutdown();
        queue.shutdown();

        for i in 0..5 {
            assert_eq!(queue.pop(), Some(i));
        }
        assert_eq!(queue.pop(), None);
        assert!(queue.is_shutdown());
    }

    #[test]
    fn test_push_after_shutdown_fails() {
        let queue = BoundedQueue::unbounded();
        queue.shutdown();
        assert!(queue.push(1).unwrap_err().is_shutdown());
        assert!(queue.try_push(2).unwrap_err().is_shutdown());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_timeout_expires() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(1);
        let start = Instant::now();
        assert_eq!(queue.pop_timeout(Duration::from_millis(20)), None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_pop_timeout_receives() {
        let queue = Arc::new(BoundedQueue::new(1));
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                queue.push(7).unwrap();
            })
        };
        assert_eq!(queue.pop_timeout(Duration::from_secs(5)), Some(7));
        producer.join().unwrap();
    }

    #[test]
    fn test_blocking_push_waits_for_space() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2))
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(1));
        assert!(producer.join().unwrap().is_ok());
        assert_eq!(queue.pop(), Some(2));
    }

    #[test]
    fn test_shutdown_wakes_blocked_producer() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2))
        };

        thread::sleep(Duration::from_millis(20));
        queue.shutdown();
        let result = producer.join().unwrap();
        assert_eq!(result.unwrap_err().into_inner(), 2);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_shutdown_wakes_blocked_consumer() {
        let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::unbounded());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };
        thread::sleep(Duration::from_millis(20));
        queue.shutdown();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let queue = BoundedQueue::new(3);
        queue.push('x').unwrap();
        queue.push('y').unwrap();
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert!(queue.try_push('z').is_ok());
    }

    #[test]
    fn test_concurrent_producers_single_consumer() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 1_000;

        let queue = Arc::new(BoundedQueue::unbounded());
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.push((p, i)).unwrap();
                    }
                })
            })
            .collect();

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut received = Vec::with_capacity(PRODUCERS * PER_PRODUCER);
                while let Some(item) = queue.pop() {
                    received.push(item);
                }
                received
            })
        };

        for producer in producers {
            producer.join().unwrap();
        }
        queue.shutdown();

        let mut received = consumer.join().unwrap();
        assert_eq!(received.len(), PRODUCERS * PER_PRODUCER);

        // Per-producer order is preserved with a single consumer
        for p in 0..PRODUCERS {
            let seq: Vec<_> = received.iter().filter(|(q, _)| *q == p).map(|(_, i)| *i).collect();
            assert_eq!(seq, (0..PER_PRODUCER).collect::<Vec<_>>());
        }

        received.sort_unstable();
        received.dedup();
        assert_eq!(received.len(), PRODUCERS * PER_PRODUCER);
    }
}
