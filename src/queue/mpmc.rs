//! Multi-producer, multi-consumer bounded queue.
//!
//! Both sides CAS-loop on their respective counters; the dequeue side
//! compares `diff` against `pos + 1` instead of `pos` since a cell must
//! have been published by a producer before any consumer can claim it.

use super::stats::QueueStats;
use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Cell<T> {
    sequence: AtomicUsize,
    data: UnsafeCell<MaybeUninit<T>>,
}

pub struct MpmcQueue<T, const CAPACITY: usize> {
    buffer: Box<[CachePadded<Cell<T>>]>,
    mask: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    stats: QueueStats,
}

unsafe impl<T: Send, const CAPACITY: usize> Send for MpmcQueue<T, CAPACITY> {}
unsafe impl<T: Send, const CAPACITY: usize> Sync for MpmcQueue<T, CAPACITY> {}

impl<T, const CAPACITY: usize> MpmcQueue<T, CAPACITY> {
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
        MpmcQueue {
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
        let mut pos = self.tail.load(Ordering::Relaxed);
        loop {
            let cell = &self.buffer[pos & self.mask];
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq as isize - (pos as isize + 1);
            if diff == 0 {
                match self.tail.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe { (*cell.data.get()).assume_init_read() };
                        cell.sequence.store(pos + CAPACITY, Ordering::Release);
                        self.stats.dequeues.fetch_add(1, Ordering::Relaxed);
                        return Some(value);
                    }
                    Err(actual) => pos = actual,
                }
            } else if diff < 0 {
                self.stats.failed_dequeues.fetch_add(1, Ordering::Relaxed);
                return None;
            } else {
                pos = self.tail.load(Ordering::Relaxed);
            }
        }
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

impl<T, const CAPACITY: usize> Default for MpmcQueue<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> Drop for MpmcQueue<T, CAPACITY> {
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
    fn fifo_order_with_single_thread() {
        let q: MpmcQueue<i32, 8> = MpmcQueue::new();
        for i in 0..8 {
            q.try_enqueue(i).unwrap();
        }
        assert!(q.try_enqueue(99).is_err());
        for i in 0..8 {
            assert_eq!(q.try_dequeue(), Some(i));
        }
    }

    #[test]
    fn concurrent_many_to_many_no_loss_or_duplication() {
        let q: Arc<MpmcQueue<u64, 4096>> = Arc::new(MpmcQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let q = q.clone();
                std::thread::spawn(move || {
                    for i in 0..5000u64 {
                        let v = p as u64 * 100_000 + i;
                        while q.enqueue(v, 1_000_000).is_err() {}
                    }
                })
            })
            .collect();

        let received: Arc<parking_lot::Mutex<HashSet<u64>>> =
            Arc::new(parking_lot::Mutex::new(HashSet::new()));
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let q = q.clone();
                let received = received.clone();
                std::thread::spawn(move || loop {
                    if let Some(v) = q.dequeue(1_000_000) {
                        received.lock().insert(v);
                    }
                    if received.lock().len() >= 20_000 {
                        break;
                    }
                })
            })
            .collect();

        for p in producers {
            p.join().unwrap();
        }
        for c in consumers {
            c.join().unwrap();
        }
        assert_eq!(received.lock().len(), 20_000);
    }
}
