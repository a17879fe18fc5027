//! Single-producer, single-consumer bounded queue.
//!
//! Wait-free on both the enqueue and dequeue fast paths: each cell carries
//! its own sequence counter (Vyukov's design), so there is no CAS anywhere
//! in this file — the single producer/consumer discipline is enough to
//! make a plain load/store race-free.

use super::stats::QueueStats;
use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Cell<T> {
    sequence: AtomicUsize,
    data: UnsafeCell<MaybeUninit<T>>,
}

/// A bounded SPSC queue with a compile-time, power-of-two capacity.
pub struct SpscQueue<T, const CAPACITY: usize> {
    buffer: Box<[CachePadded<Cell<T>>]>,
    mask: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    stats: QueueStats,
}

// Safety: `T: Send` is required because values cross from the producer
// thread to the consumer thread through the cell array.
unsafe impl<T: Send, const CAPACITY: usize> Send for SpscQueue<T, CAPACITY> {}
unsafe impl<T: Send, const CAPACITY: usize> Sync for SpscQueue<T, CAPACITY> {}

impl<T, const CAPACITY: usize> SpscQueue<T, CAPACITY> {
    pub fn new() -> Self {
        assert!(CAPACITY.is_power_of_two(), "capacity must be a power of two");
        let buffer: Box<[CachePadded<Cell<T>>]> = (0..CAPACITY)
            .map(|i| {
                CachePadded::new(Cell {
                    sequence: AtomicUsize::new(i),
                    data: UnsafeCell::new(MaybeUninit::uninit()),
                })
            })
            .collect();
        SpscQueue {
            buffer,
            mask: CAPACITY - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            stats: QueueStats::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        CAPACITY
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Never blocks, never allocates. Returns the value back on failure so
    /// nothing is silently dropped.
    pub fn try_enqueue(&self, value: T) -> Result<(), T> {
        let pos = self.head.load(Ordering::Relaxed);
        let cell = &self.buffer[pos & self.mask];
        let seq = cell.sequence.load(Ordering::Acquire);
        if seq != pos {
            self.stats.failed_enqueues.fetch_add(1, Ordering::Relaxed);
            return Err(value);
        }
        unsafe { (*cell.data.get()).write(value) };
        cell.sequence.store(pos + 1, Ordering::Release);
        self.head.store(pos + 1, Ordering::Relaxed);
        self.stats.enqueues.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn try_dequeue(&self) -> Option<T> {
        let pos = self.tail.load(Ordering::Relaxed);
        let cell = &self.buffer[pos & self.mask];
        let seq = cell.sequence.load(Ordering::Acquire);
        if seq != pos + 1 {
            self.stats.failed_dequeues.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let value = unsafe { (*cell.data.get()).assume_init_read() };
        cell.sequence.store(pos + CAPACITY, Ordering::Release);
        self.tail.store(pos + 1, Ordering::Relaxed);
        self.stats.dequeues.fetch_add(1, Ordering::Relaxed);
        Some(value)
    }

    /// Spin-wait variant retrying with a CPU pause hint between attempts.
    pub fn enqueue(&self, mut value: T, max_spins: u32) -> Result<(), T> {
        for _ in 0..max_spins {
            match self.try_enqueue(value) {
                Ok(()) => return Ok(()),
                Err(v) => {
                    value = v;
                    self.stats.spins.fetch_add(1, Ordering::Relaxed);
                    std::hint::spin_loop();
                }
            }
        }
        Err(value)
    }

    pub fn dequeue(&self, max_spins: u32) -> Option<T> {
        for _ in 0..max_spins {
            if let Some(v) = self.try_dequeue() {
                return Some(v);
            }
            self.stats.spins.fetch_add(1, Ordering::Relaxed);
            std::hint::spin_loop();
        }
        None
    }

    pub fn size_approx(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        head.saturating_sub(tail)
    }

    pub fn is_empty(&self) -> bool {
        self.size_approx() == 0
    }
}

impl<T, const CAPACITY: usize> Default for SpscQueue<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> Drop for SpscQueue<T, CAPACITY> {
    fn drop(&mut self) {
        while self.try_dequeue().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_within_capacity() {
        let q: SpscQueue<i32, 4> = SpscQueue::new();
        for i in 0..4 {
            assert!(q.try_enqueue(i).is_ok());
        }
        assert!(q.try_enqueue(99).is_err());
        for i in 0..4 {
            assert_eq!(q.try_dequeue(), Some(i));
        }
        assert_eq!(q.try_dequeue(), None);
    }

    #[test]
    fn full_and_empty_are_non_fatal() {
        let q: SpscQueue<i32, 2> = SpscQueue::new();
        assert_eq!(q.try_dequeue(), None);
        assert_eq!(q.stats().snapshot().failed_dequeues, 1);
        q.try_enqueue(1).unwrap();
        q.try_enqueue(2).unwrap();
        assert!(q.try_enqueue(3).is_err());
        assert_eq!(q.stats().snapshot().failed_enqueues, 1);
    }

    #[test]
    fn concurrent_producer_consumer_preserves_order() {
        use std::sync::Arc;
        let q: Arc<SpscQueue<u64, 1024>> = Arc::new(SpscQueue::new());
        let producer_q = q.clone();
        let producer = std::thread::spawn(move || {
            for i in 0..100_000u64 {
                while producer_q.enqueue(i, 10_000).is_err() {}
            }
        });
        let mut received = Vec::with_capacity(100_000);
        while received.len() < 100_000 {
            if let Some(v) = q.dequeue(10_000) {
                received.push(v);
            }
        }
        producer.join().unwrap();
        assert_eq!(received, (0..100_000u64).collect::<Vec<_>>());
    }
}
