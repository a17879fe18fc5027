//! Runtime-sized MPMC queue, for configuration-driven capacities
//! that aren't known at compile time. Same claim protocol as
//! [`super::mpmc::MpmcQueue`], just with a `Vec`-backed ring instead of a
//! const-generic array.

use super::stats::QueueStats;
use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Cell<T> {
    sequence: AtomicUsize,
    data: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded MPMC queue whose capacity is chosen at construction time and
/// rounded up to the next power of two.
pub struct BoundedMpmcQueue<T> {
    buffer: Box<[CachePadded<Cell<T>>]>,
    mask: usize,
    capacity: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    stats: QueueStats,
}

unsafe impl<T: Send> Send for BoundedMpmcQueue<T> {}
unsafe impl<T: Send> Sync for BoundedMpmcQueue<T> {}

impl<T> BoundedMpmcQueue<T> {
    pub fn with_capacity(requested: usize) -> Self {
        let capacity = requested.max(2).next_power_of_two();
        let buffer: Box<[CachePadded<Cell<T>>]> = (0..capacity)
            .map(|i| {
                CachePadded::new(Cell {
                    sequence: AtomicUsize::new(i),
                    data: UnsafeCell::new(MaybeUninit::uninit()),
                })
            })
            .collect();
        BoundedMpmcQueue {
            buffer,
            mask: capacity - 1,
            capacity,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            stats: QueueStats::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
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
                        cell.sequence
                            .store(pos + self.capacity, Ordering::Release);
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

    pub fn fill_ratio(&self) -> f64 {
        self.size_approx() as f64 / self.capacity as f64
    }
}

impl<T> Drop for BoundedMpmcQueue<T> {
    fn drop(&mut self) {
        while self.try_dequeue().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        let q: BoundedMpmcQueue<i32> = BoundedMpmcQueue::with_capacity(100);
        assert_eq!(q.capacity(), 128);
    }

    #[test]
    fn fill_ratio_reflects_occupancy() {
        let q: BoundedMpmcQueue<i32> = BoundedMpmcQueue::with_capacity(4);
        q.try_enqueue(1).unwrap();
        q.try_enqueue(2).unwrap();
        assert_eq!(q.fill_ratio(), 0.5);
    }

    #[test]
    fn drains_fifo() {
        let q: BoundedMpmcQueue<i32> = BoundedMpmcQueue::with_capacity(4);
        for i in 0..4 {
            q.try_enqueue(i).unwrap();
        }
        for i in 0..4 {
            assert_eq!(q.try_dequeue(), Some(i));
        }
        assert_eq!(q.try_dequeue(), None);
    }
}
