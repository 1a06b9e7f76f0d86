//! Closable multi-producer multi-consumer blocking channel.
//!
//! Worker threads consume it with a plain `for` loop:
//!
//! ```
//! use async_python_ffi::bridge::Channel;
//!
//! let ch = Channel::unbounded();
//! let rx = ch.clone();
//! let worker = std::thread::spawn(move || rx.iter().sum::<i32>());
//!
//! ch.add(1).unwrap();
//! ch.add(2).unwrap();
//! while !ch.is_empty() {
//!     std::thread::yield_now();
//! }
//! ch.close();
//! assert_eq!(worker.join().unwrap(), 3);
//! ```
//!
//! Closing stops every consumer immediately, even when items are still
//! queued; those items are dropped.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Returned by [`Channel::add`] when the channel is closed. Holds the rejected item.
#[derive(PartialEq, Eq)]
pub struct ChannelClosed<T>(pub T);

impl<T> fmt::Debug for ChannelClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChannelClosed(..)")
    }
}

impl<T> fmt::Display for ChannelClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("channel is closed")
    }
}

impl<T> std::error::Error for ChannelClosed<T> {}

struct State<T> {
    queue: VecDeque<T>,
    open: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
}

pub struct Channel<T> {
    inner: Arc<Shared<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("len", &self.len())
            .field("open", &self.is_open())
            .field("capacity", &self.inner.capacity)
            .finish()
    }
}

impl<T> Channel<T> {
    /// `capacity` of `None` means unbounded. A capacity of zero is treated as one.
    pub fn new(capacity: Option<usize>) -> Self {
        let capacity = capacity.map(|c| c.max(1));
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::with_capacity(capacity.unwrap_or(0)),
                    open: true,
                }),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                capacity,
            }),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn bounded(capacity: usize) -> Self {
        Self::new(Some(capacity))
    }

    // A poisoned lock only means another user panicked while holding it;
    // the queue itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Push an item, blocking while the channel is open and full.
    pub fn add(&self, item: T) -> Result<(), ChannelClosed<T>> {
        let mut state = self.lock();
        while let Some(cap) = self.inner.capacity {
            if !state.open || state.queue.len() < cap {
                break;
            }
            state = self
                .inner
                .not_full
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if !state.open {
            return Err(ChannelClosed(item));
        }
        state.queue.push_back(item);
        self.inner.not_empty.notify_one();
        Ok(())
    }

    /// Pop the next item, blocking while the channel is open and empty.
    /// Returns `None` once the channel is closed.
    pub fn recv(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if !state.open {
                return None;
            }
            if let Some(item) = state.queue.pop_front() {
                self.inner.not_full.notify_one();
                return Some(item);
            }
            state = self
                .inner
                .not_empty
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Close the channel and wake every waiting producer and consumer.
    pub fn close(&self) {
        let mut state = self.lock();
        state.open = false;
        self.inner.not_empty.notify_all();
        self.inner.not_full.notify_all();
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.capacity
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter { channel: self }
    }
}

/// Blocking iterator over a [`Channel`]; ends when the channel closes.
pub struct Iter<'a, T> {
    channel: &'a Channel<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.channel.recv()
    }
}

impl<'a, T> IntoIterator for &'a Channel<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let ch = Channel::unbounded();
        for i in 1..=3 {
            ch.add(i).unwrap();
        }
        assert_eq!(ch.len(), 3);
        assert_eq!(ch.recv(), Some(1));
        assert_eq!(ch.recv(), Some(2));
        assert_eq!(ch.recv(), Some(3));
        assert!(ch.is_empty());
    }

    #[test]
    fn test_add_after_close_returns_item() {
        let ch = Channel::unbounded();
        ch.close();
        ch.close();
        assert!(!ch.is_open());
        assert_eq!(ch.add("late"), Err(ChannelClosed("late")));
    }

    #[test]
    fn test_close_discards_pending_items() {
        let ch = Channel::unbounded();
        ch.add(1).unwrap();
        ch.add(2).unwrap();
        ch.close();
        assert_eq!(ch.recv(), None);
        assert_eq!(ch.iter().count(), 0);
    }

    #[test]
    fn test_worker_iterates_until_closed() {
        let ch = Channel::unbounded();
        let (done_tx, done_rx) = mpsc::channel();
        let rx = ch.clone();
        let worker = thread::spawn(move || {
            let mut seen = Vec::new();
            for item in &rx {
                seen.push(item);
                done_tx.send(()).unwrap();
            }
            seen
        });

        for i in 1..=3 {
            ch.add(i).unwrap();
        }
        for _ in 0..3 {
            done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        ch.close();

        assert_eq!(worker.join().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_bounded_add_blocks_until_consumed() {
        let ch = Channel::bounded(1);
        ch.add(1).unwrap();

        let producer = {
            let ch = ch.clone();
            thread::spawn(move || ch.add(2))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(ch.len(), 1);
        assert_eq!(ch.recv(), Some(1));

        producer.join().unwrap().unwrap();
        assert_eq!(ch.recv(), Some(2));
    }

    #[test]
    fn test_close_wakes_blocked_producer() {
        let ch = Channel::bounded(1);
        ch.add(1).unwrap();

        let producer = {
            let ch = ch.clone();
            thread::spawn(move || ch.add(2))
        };

        thread::sleep(Duration::from_millis(50));
        ch.close();
        assert_eq!(producer.join().unwrap(), Err(ChannelClosed(2)));
    }

    #[test]
    fn test_close_wakes_blocked_consumer() {
        let ch: Channel<u8> = Channel::unbounded();
        let consumer = {
            let ch = ch.clone();
            thread::spawn(move || ch.recv())
        };

        thread::sleep(Duration::from_millis(50));
        ch.close();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let ch: Channel<()> = Channel::bounded(0);
        assert_eq!(ch.capacity(), Some(1));
    }
}
