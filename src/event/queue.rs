//! A bounded, thread-safe event queue
//!
//! Fixed capacity, strict FIFO, one mutex and two condition variables.
//! The read and write indices run over `0..2 * capacity` so that a full
//! queue and an empty queue are distinguishable without a separate count.
//! All waits re-check their predicate in a loop, so spurious wakeups are
//! harmless.
//!
//! The reader task is the producer; the UI thread drains a whole batch
//! under a single lock acquisition per frame via [`EventQueue::drain`].

use std::sync::{Condvar, Mutex, MutexGuard};

struct Inner<T> {
    buf: Vec<Option<T>>,
    /// Read index in `0..2 * capacity`
    read: usize,
    /// Write index in `0..2 * capacity`
    write: usize,
}

impl<T> Inner<T> {
    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn is_empty(&self) -> bool {
        self.read == self.write
    }

    fn is_full(&self) -> bool {
        let wrap = 2 * self.capacity();
        (self.write + wrap - self.read) % wrap == self.capacity()
    }

    fn len(&self) -> usize {
        let wrap = 2 * self.capacity();
        (self.write + wrap - self.read) % wrap
    }

    fn push(&mut self, item: T) {
        let slot = self.write % self.capacity();
        self.buf[slot] = Some(item);
        self.write = (self.write + 1) % (2 * self.capacity());
    }

    fn pop(&mut self) -> T {
        let slot = self.read % self.capacity();
        let item = self.buf[slot].take();
        self.read = (self.read + 1) % (2 * self.capacity());
        // Non-empty was checked under the same lock
        item.expect("occupied slot between read and write indices")
    }
}

/// A bounded multi-producer FIFO with blocking and non-blocking ends
pub struct EventQueue<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> EventQueue<T> {
    /// Create a queue holding at most `capacity` items
    ///
    /// # Panics
    ///
    /// Panics when `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        let mut buf = Vec::with_capacity(capacity);
        buf.resize_with(capacity, || None);
        Self {
            inner: Mutex::new(Inner {
                buf,
                read: 0,
                write: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // A poisoned queue only means a panicking producer; the data is
        // still structurally sound
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an item, blocking while the queue is full
    pub fn push(&self, item: T) {
        let mut inner = self.lock();
        while inner.is_full() {
            inner = self
                .not_full
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
        inner.push(item);
        drop(inner);
        self.not_empty.notify_one();
    }

    /// Append an item if there is room; `false` means the queue was full
    pub fn try_push(&self, item: T) -> bool {
        let mut inner = self.lock();
        if inner.is_full() {
            return false;
        }
        inner.push(item);
        drop(inner);
        self.not_empty.notify_one();
        true
    }

    /// Remove the oldest item, blocking while the queue is empty
    pub fn pop(&self) -> T {
        let mut inner = self.lock();
        while inner.is_empty() {
            inner = self
                .not_empty
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
        let item = inner.pop();
        drop(inner);
        self.not_full.notify_one();
        item
    }

    /// Remove the oldest item if one exists
    pub fn try_pop(&self) -> Option<T> {
        let mut inner = self.lock();
        if inner.is_empty() {
            return None;
        }
        let item = inner.pop();
        drop(inner);
        self.not_full.notify_one();
        Some(item)
    }

    /// Block until the queue is non-empty without removing anything
    pub fn poll(&self) {
        let mut inner = self.lock();
        while inner.is_empty() {
            inner = self
                .not_empty
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Pop everything currently queued under one lock acquisition
    ///
    /// The returned iterator holds the queue lock for its whole lifetime;
    /// producers block (or see a full queue) until it is dropped, at which
    /// point they are woken.
    pub fn drain(&self) -> Drain<'_, T> {
        Drain {
            queue: self,
            inner: Some(self.lock()),
        }
    }
}

/// Iterator over a drained batch; holds the queue lock. See
/// [`EventQueue::drain`].
pub struct Drain<'a, T> {
    queue: &'a EventQueue<T>,
    inner: Option<MutexGuard<'a, Inner<T>>>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let inner = self.inner.as_mut()?;
        if inner.is_empty() {
            None
        } else {
            Some(inner.pop())
        }
    }
}

impl<T> Drop for Drain<'_, T> {
    fn drop(&mut self) {
        // Release the lock before waking writers
        self.inner.take();
        self.queue.not_full.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let q = EventQueue::new(8);
        for i in 0..5 {
            q.push(i);
        }
        let out: Vec<i32> = (0..5).map(|_| q.pop()).collect();
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_full_is_not_empty() {
        let q = EventQueue::new(2);
        assert!(q.try_push(1));
        assert!(q.try_push(2));
        assert!(!q.try_push(3));
        assert_eq!(q.len(), 2);
        assert_eq!(q.try_pop(), Some(1));
        assert!(q.try_push(3));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), Some(3));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn test_wraparound_preserves_fifo() {
        let q = EventQueue::new(3);
        for round in 0..10 {
            q.push(round * 2);
            q.push(round * 2 + 1);
            assert_eq!(q.pop(), round * 2);
            assert_eq!(q.pop(), round * 2 + 1);
        }
        assert!(q.is_empty());
    }

    #[test]
    fn test_drain_takes_everything_under_one_lock() {
        let q = EventQueue::new(8);
        for i in 0..6 {
            q.push(i);
        }
        let drained: Vec<i32> = q.drain().collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4, 5]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_blocking_pop_wakes_on_push() {
        let q = Arc::new(EventQueue::new(4));
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop())
        };
        thread::sleep(Duration::from_millis(20));
        q.push(42);
        assert_eq!(consumer.join().unwrap(), 42);
    }

    #[test]
    fn test_capacity_one_two_writers_one_reader() {
        let q = Arc::new(EventQueue::new(1));
        let writers: Vec<_> = (0..2)
            .map(|w| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    for i in 0..50 {
                        q.push(w * 100 + i);
                    }
                })
            })
            .collect();

        let mut seen = Vec::with_capacity(100);
        for _ in 0..100 {
            seen.push(q.pop());
        }
        for writer in writers {
            writer.join().unwrap();
        }

        // All items arrive exactly once, and each writer's items in order
        for w in 0..2 {
            let per_writer: Vec<i32> =
                seen.iter().copied().filter(|v| v / 100 == w).collect();
            let expected: Vec<i32> = (0..50).map(|i| w * 100 + i).collect();
            assert_eq!(per_writer, expected);
        }
    }

    #[test]
    fn test_poll_does_not_pop() {
        let q = Arc::new(EventQueue::new(4));
        q.push(7);
        q.poll();
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop(), 7);
    }

    #[test]
    fn test_blocked_push_wakes_when_drain_drops() {
        let q = Arc::new(EventQueue::new(1));
        q.push(1);
        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.push(2))
        };
        thread::sleep(Duration::from_millis(20));
        let drained: Vec<i32> = q.drain().collect();
        assert_eq!(drained, vec![1]);
        producer.join().unwrap();
        assert_eq!(q.pop(), 2);
    }
}
