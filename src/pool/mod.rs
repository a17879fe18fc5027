//! Bounded object pool: a fixed-capacity free list of `T`-sized
//! slots, organized in 256-slot chunks, so hot-path `DataPoint` bodies
//! larger than the inline budget don't have to go through the heap
//! allocator on every message.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

const CHUNK_SIZE: usize = 256;

struct Chunk<T> {
    slots: Vec<Option<Box<T>>>,
}

impl<T> Chunk<T> {
    fn new() -> Self {
        let mut slots = Vec::with_capacity(CHUNK_SIZE);
        slots.resize_with(CHUNK_SIZE, || None);
        Chunk { slots }
    }
}

/// A handle returned by [`ObjectPool::allocate`]. Dropping it returns the
/// slot to the pool automatically.
pub struct PooledSlot<'a, T> {
    value: Option<Box<T>>,
    pool: &'a ObjectPool<T>,
}

impl<'a, T> std::ops::Deref for PooledSlot<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.value.as_ref().expect("slot always holds a value until drop")
    }
}

impl<'a, T> std::ops::DerefMut for PooledSlot<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("slot always holds a value until drop")
    }
}

impl<'a, T> Drop for PooledSlot<'a, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.deallocate(value);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: u64,
}

/// Fixed-capacity free-list allocator. No recursion through the heap
/// allocator on the hot path: `allocate` either hands back a recycled
/// `Box<T>` or returns `None` so the caller can fall back to a normal
/// heap allocation or drop the message.
pub struct ObjectPool<T> {
    free: Mutex<Vec<Box<T>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T: Default> ObjectPool<T> {
    /// `chunks` rounds `capacity` up to a whole number of 256-slot chunks.
    pub fn new(capacity: usize) -> Self {
        let chunk_count = (capacity + CHUNK_SIZE - 1) / CHUNK_SIZE;
        let total = chunk_count * CHUNK_SIZE;
        let mut free = Vec::with_capacity(total);
        for _ in 0..total {
            free.push(Box::new(T::default()));
        }
        ObjectPool {
            free: Mutex::new(free),
            capacity: total,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<T> ObjectPool<T> {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a pooled slot, or `None` if the free list is exhausted.
    pub fn allocate(&self) -> Option<PooledSlot<'_, T>> {
        let mut free = self.free.lock();
        match free.pop() {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(PooledSlot {
                    value: Some(value),
                    pool: self,
                })
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn deallocate(&self, value: Box<T>) {
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(value);
        }
    }

    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            capacity: self.capacity as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Payload {
        bytes: [u8; 64],
    }

    #[test]
    fn capacity_rounds_up_to_whole_chunks() {
        let pool: ObjectPool<Payload> = ObjectPool::new(10);
        assert_eq!(pool.capacity(), CHUNK_SIZE);
    }

    #[test]
    fn allocate_exhausts_then_reports_miss() {
        let pool: ObjectPool<Payload> = ObjectPool::new(1);
        let slots: Vec<_> = (0..CHUNK_SIZE).filter_map(|_| pool.allocate()).collect();
        assert_eq!(slots.len(), CHUNK_SIZE);
        assert!(pool.allocate().is_none());
        assert_eq!(pool.stats().misses, 1);
        assert_eq!(pool.stats().hits, CHUNK_SIZE as u64);
    }

    #[test]
    fn dropping_slot_returns_it_to_the_pool() {
        let pool: ObjectPool<Payload> = ObjectPool::new(1);
        assert_eq!(pool.available(), CHUNK_SIZE);
        {
            let _slot = pool.allocate().unwrap();
            assert_eq!(pool.available(), CHUNK_SIZE - 1);
        }
        assert_eq!(pool.available(), CHUNK_SIZE);
    }

    #[test]
    fn mutation_through_deref_mut_is_visible() {
        let pool: ObjectPool<Payload> = ObjectPool::new(1);
        let mut slot = pool.allocate().unwrap();
        slot.bytes[0] = 42;
        assert_eq!(slot.bytes[0], 42);
    }
}
