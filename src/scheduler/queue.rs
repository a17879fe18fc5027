//! The priority queue backing the EDF scheduler: a `BinaryHeap`
//! ordered earliest-deadline-first behind a mutex and condvar.

use super::task::ScheduledTask;
use parking_lot::{Condvar, Mutex};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

pub(crate) struct EdfQueue {
    heap: Mutex<BinaryHeap<Reverse<ScheduledTask>>>,
    not_empty: Condvar,
    capacity: Option<usize>,
}

impl EdfQueue {
    pub fn new(capacity: Option<usize>) -> Self {
        EdfQueue {
            heap: Mutex::new(BinaryHeap::new()),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Pushes `task` unless the queue is already at capacity, in which case
    /// it is returned to the caller untouched.
    pub fn try_push(&self, task: ScheduledTask) -> Result<(), ScheduledTask> {
        let mut heap = self.heap.lock();
        if let Some(capacity) = self.capacity {
            if heap.len() >= capacity {
                return Err(task);
            }
        }
        heap.push(Reverse(task));
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pops the earliest-deadline task, blocking up to `timeout` if the
    /// queue is currently empty. Returns `None` on timeout.
    pub fn pop_wait(&self, timeout: Duration) -> Option<ScheduledTask> {
        let mut heap = self.heap.lock();
        if heap.is_empty() {
            self.not_empty.wait_for(&mut heap, timeout);
        }
        heap.pop().map(|Reverse(t)| t)
    }

    /// Pops every remaining task in deadline order, emptying the queue.
    pub fn drain(&self) -> Vec<ScheduledTask> {
        let mut heap = self.heap.lock();
        let mut out = Vec::with_capacity(heap.len());
        while let Some(Reverse(t)) = heap.pop() {
            out.push(t);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DataPoint, Timestamp, Value};

    fn task(deadline_ns: i64, seq: u64) -> ScheduledTask {
        ScheduledTask::new(
            DataPoint::new("x", Value::Empty),
            vec![],
            Timestamp::from_nanos(0),
            Timestamp::from_nanos(deadline_ns),
            seq,
        )
    }

    #[test]
    fn pop_returns_earliest_deadline_first() {
        let q = EdfQueue::new(None);
        q.try_push(task(300, 0)).unwrap();
        q.try_push(task(100, 1)).unwrap();
        q.try_push(task(200, 2)).unwrap();
        assert_eq!(q.pop_wait(Duration::from_millis(1)).unwrap().deadline, Timestamp::from_nanos(100));
        assert_eq!(q.pop_wait(Duration::from_millis(1)).unwrap().deadline, Timestamp::from_nanos(200));
        assert_eq!(q.pop_wait(Duration::from_millis(1)).unwrap().deadline, Timestamp::from_nanos(300));
    }

    #[test]
    fn pop_wait_times_out_on_empty_queue() {
        let q = EdfQueue::new(None);
        assert!(q.pop_wait(Duration::from_millis(5)).is_none());
    }

    #[test]
    fn drain_empties_the_queue_in_order() {
        let q = EdfQueue::new(None);
        q.try_push(task(50, 0)).unwrap();
        q.try_push(task(10, 1)).unwrap();
        let drained = q.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].deadline, Timestamp::from_nanos(10));
        assert!(q.is_empty());
    }

    #[test]
    fn try_push_rejects_once_capacity_is_reached() {
        let q = EdfQueue::new(Some(2));
        q.try_push(task(100, 0)).unwrap();
        q.try_push(task(200, 1)).unwrap();
        let rejected = q.try_push(task(300, 2));
        assert!(rejected.is_err());
        assert_eq!(q.len(), 2);
    }
}
