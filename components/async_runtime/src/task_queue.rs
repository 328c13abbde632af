//! Task and microtask queue management.
//!
//! Tasks are executed one at a time; all microtasks drain before the next
//! task runs. Both run on the loop thread with mutable access to the host.

use std::collections::VecDeque;
use std::fmt;

type Callback<H, E> = Box<dyn FnOnce(&mut H) -> Result<(), E>>;

/// A unit of work run on the loop thread.
///
/// `H` is the host the task operates on (typically the interpreter) and `E`
/// the error a task may fail with.
pub struct Task<H, E> {
    callback: Callback<H, E>,
}

impl<H, E> Task<H, E> {
    /// Creates a new Task from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut H) -> Result<(), E> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Runs the task against the host, consuming it.
    pub fn run(self, host: &mut H) -> Result<(), E> {
        (self.callback)(host)
    }
}

impl<H, E> fmt::Debug for Task<H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

/// FIFO queue of tasks.
pub struct TaskQueue<H, E> {
    queue: VecDeque<Task<H, E>>,
}

impl<H, E> TaskQueue<H, E> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a task to the back of the queue.
    pub fn enqueue(&mut self, task: Task<H, E>) {
        self.queue.push_back(task);
    }

    /// Removes the oldest task.
    pub fn dequeue(&mut self) -> Option<Task<H, E>> {
        self.queue.pop_front()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every queued task without running it.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl<H, E> Default for TaskQueue<H, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, E> fmt::Debug for TaskQueue<H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue").field("len", &self.len()).finish()
    }
}
