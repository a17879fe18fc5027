//! Multi-producer, single-consumer bounded queue.
//!
//! Producers CAS-loop on the shared `head` counter to claim a slot;
//! the single consumer reads `tail` without a CAS since nothing else
//! ever advances it.

use super::stats::QueueStats;
use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Cell<T> {
    sequence: AtomicUsize,
    data: UnsafeCell<MaybeUninit<T>>,
}

pub struct MpscQueue<T, const CAPACITY: usize> {
    buffer: Box<[CachePadded<Cell<T>>]>,
    mask: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    stats: QueueStats,
}

unsafe impl<T: Send, const CAPACITY: usize> Send for MpscQueue<T, CAPACITY> {}
unsafe impl<T: Send, const CAPACITY: usize> Sync for MpscQueue<T, CAPACITY> {}

impl<T, const CAPACITY: usize> MpscQueue<T, CAPACITY> {
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
        MpscQueue {
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

    pub fn try_enqueue(&self, value: T) -> Result<(), T> {
        let mut pos = self.head.load(Ordering::Relaxed);
        loop {
            let cell = &self.buffer[pos & self.mask];
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;
            if diff == 0 {
                match self.head.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { (*cell.data.get()).write(value) };
                        cell.sequence.store(pos + 1, Ordering::Release);
                        self.stats.enqueues.fetch_add(1, Ordering::Relaxed);
                        return Ok(());
                    }
                    Err(actual) => pos = actual,
                }
            } else if diff < 0 {
                self.stats.failed_enqueues.fetch_add(1, Ordering::Relaxed);
                return Err(value);
            } else {
                pos = self.head.load(Ordering::Relaxed);
            }
        }
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

impl<T, const CAPACITY: usize> Default for MpscQueue<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> Drop for MpscQueue<T, CAPACITY> {
    fn drop(&mut self) {
        while self.try_dequeue().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn fifo_single_producer() {
        let q: MpscQueue<i32, 4> = MpscQueue::new();
        for i in 0..4 {
            assert!(q.try_enqueue(i).is_ok());
        }
        assert!(q.try_enqueue(99).is_err());
        for i in 0..4 {
            assert_eq!(q.try_dequeue(), Some(i));
        }
    }

    #[test]
    fn concurrent_producers_all_values_delivered_exactly_once() {
        let q: Arc<MpscQueue<u64, 4096>> = Arc::new(MpscQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let q = q.clone();
                std::thread::spawn(move || {
                    for i in 0..5000u64 {
                        let v = p as u64 * 100_000 + i;
                        while q.enqueue(v, 100_000).is_err() {}
                    }
                })
            })
            .collect();
        let mut received = HashSet::new();
        while received.len() < 20_000 {
            if let Some(v) = q.dequeue(1_000_000) {
                received.insert(v);
            }
        }
        for p in producers {
            p.join().unwrap();
        }
        assert_eq!(received.len(), 20_000);
    }
}
