//! Timer queue ordered by deadline.

use crate::task_queue::Task;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

/// Handle returned when a timer is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Numeric id exposed to scripts.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Rebuilds an id received back from a script.
    pub fn from_u64(id: u64) -> Self {
        TimerId(id)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Scheduled {
    deadline: Instant,
    id: u64,
}

// BinaryHeap is a max-heap; invert so the earliest deadline (then the
// earliest scheduled) comes out first.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending timers. Cancelled timers are dropped lazily from the heap.
pub struct TimerQueue<H, E> {
    heap: BinaryHeap<Scheduled>,
    callbacks: HashMap<u64, Task<H, E>>,
    next_id: u64,
}

impl<H, E> TimerQueue<H, E> {
    /// Creates an empty timer queue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            callbacks: HashMap::new(),
            next_id: 1,
        }
    }

    /// Schedules `task` to become runnable after `delay`.
    pub fn schedule(&mut self, delay: Duration, task: Task<H, E>) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Scheduled {
            deadline: Instant::now() + delay,
            id,
        });
        self.callbacks.insert(id, task);
        TimerId(id)
    }

    /// Cancels a timer. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.callbacks.remove(&id.0).is_some()
    }

    /// Earliest deadline among live timers.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_cancelled();
        self.heap.peek().map(|s| s.deadline)
    }

    /// Removes and returns the next timer whose deadline is at or before `now`.
    pub fn pop_expired(&mut self, now: Instant) -> Option<Task<H, E>> {
        self.discard_cancelled();
        if self.heap.peek()?.deadline > now {
            return None;
        }
        let scheduled = self.heap.pop()?;
        self.callbacks.remove(&scheduled.id)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns true if no timer is pending.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Drops all timers.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.callbacks.clear();
    }

    fn discard_cancelled(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.callbacks.contains_key(&top.id) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<H, E> Default for TimerQueue<H, E> {
    fn default() -> Self {
        Self::new()
    }
}
