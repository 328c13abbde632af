//! Event loop implementation.
//!
//! The loop owns the task, microtask and timer queues plus the bookkeeping
//! for background jobs. Each turn yields one runnable [`Task`]:
//! 1. Microtasks queued by the previous task drain first
//! 2. Then the oldest macrotask
//! 3. Then the earliest expired timer
//! 4. Then the next finished background job
//!
//! When nothing is runnable but timers or jobs are outstanding, the loop
//! thread blocks on the completion channel until a job finishes, a timer
//! becomes due or the loop is interrupted.

use crate::error::TaskError;
use crate::task_queue::{Task, TaskQueue};
use crate::timers::{TimerId, TimerQueue};
use crate::worker::{panic_message, WorkerPool};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Payload = Result<Box<dyn Any + Send>, TaskError>;
type Continuation<H, E> = Box<dyn FnOnce(&mut H, Payload) -> Result<(), E>>;

enum Message {
    Completion { id: u64, payload: Payload },
    Wake,
}

/// Event loop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLoopConfig {
    /// Number of background worker threads
    pub worker_threads: usize,
    /// Thread name prefix for workers
    pub thread_name: String,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            thread_name: "corten-io".to_string(),
        }
    }
}

/// Result of asking the loop for its next unit of work
pub enum Turn<H, E> {
    /// A task ready to run
    Task(Task<H, E>),
    /// Nothing queued and nothing outstanding: the loop has drained
    Idle,
    /// The loop was interrupted through a [`LoopHandle`]
    Interrupted,
}

impl<H, E> fmt::Debug for Turn<H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Turn::Task(_) => f.write_str("Turn::Task"),
            Turn::Idle => f.write_str("Turn::Idle"),
            Turn::Interrupted => f.write_str("Turn::Interrupted"),
        }
    }
}

/// Thread-safe handle used to interrupt a running loop from another thread.
#[derive(Clone)]
pub struct LoopHandle {
    interrupted: Arc<AtomicBool>,
    sender: Sender<Message>,
}

impl LoopHandle {
    /// Requests the loop to stop at the next turn.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        let _ = self.sender.send(Message::Wake);
    }

    /// Returns true once [`LoopHandle::interrupt`] has been called.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Shared flag, for code that polls it (e.g. inside long-running loops).
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }
}

impl fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopHandle")
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

/// The event loop.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
///
/// let mut event_loop: EventLoop<Vec<u32>, ()> = EventLoop::new();
/// event_loop.enqueue_task(Task::new(|log: &mut Vec<u32>| {
///     log.push(1);
///     Ok(())
/// }));
///
/// let mut log = Vec::new();
/// event_loop.run_until_idle(&mut log).unwrap();
/// assert_eq!(log, vec![1]);
/// ```
pub struct EventLoop<H, E> {
    config: EventLoopConfig,
    tasks: TaskQueue<H, E>,
    microtasks: TaskQueue<H, E>,
    timers: TimerQueue<H, E>,
    pending: HashMap<u64, Continuation<H, E>>,
    pool: Option<WorkerPool>,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    interrupted: Arc<AtomicBool>,
    next_job_id: u64,
    closed: bool,
}

/// How [`EventLoop::run_until_idle`] stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All work drained
    Idle,
    /// Interrupted through a [`LoopHandle`]
    Interrupted,
}

impl<H: 'static, E: 'static> EventLoop<H, E> {
    /// Creates a loop with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    /// Creates a loop. Worker threads start lazily on the first [`EventLoop::submit`].
    pub fn with_config(config: EventLoopConfig) -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            config,
            tasks: TaskQueue::new(),
            microtasks: TaskQueue::new(),
            timers: TimerQueue::new(),
            pending: HashMap::new(),
            pool: None,
            sender,
            receiver,
            interrupted: Arc::new(AtomicBool::new(false)),
            next_job_id: 1,
            closed: false,
        }
    }

    /// Returns a handle that can interrupt this loop from any thread.
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            interrupted: self.interrupted.clone(),
            sender: self.sender.clone(),
        }
    }

    /// Returns true once the loop has been interrupted.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Adds a macrotask.
    pub fn enqueue_task(&mut self, task: Task<H, E>) {
        self.tasks.enqueue(task);
    }

    /// Adds a microtask; microtasks run before the next macrotask.
    pub fn enqueue_microtask(&mut self, task: Task<H, E>) {
        self.microtasks.enqueue(task);
    }

    /// Schedules a timer.
    pub fn set_timeout(&mut self, delay: Duration, task: Task<H, E>) -> TimerId {
        self.timers.schedule(delay, task)
    }

    /// Cancels a timer. Returns false if it already ran or never existed.
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Starts the worker threads now instead of on the first submit.
    ///
    /// Hosts call this while provisioning so a spawn failure surfaces before
    /// any script runs. Does nothing if the pool is already running.
    pub fn start_workers(&mut self) -> Result<(), TaskError> {
        if self.closed {
            return Err(TaskError::ShutDown);
        }
        if self.pool.is_none() {
            self.pool = Some(WorkerPool::new(
                &self.config.thread_name,
                self.config.worker_threads,
            )?);
        }
        Ok(())
    }

    /// Runs `job` on a worker thread, then runs `continuation` on the loop
    /// thread with its result.
    ///
    /// If the job panics the continuation receives [`TaskError::JobPanicked`],
    /// so every submitted job completes exactly once.
    pub fn submit<T, J, C>(&mut self, job: J, continuation: C) -> Result<(), TaskError>
    where
        T: Send + 'static,
        J: FnOnce() -> T + Send + 'static,
        C: FnOnce(&mut H, Result<T, TaskError>) -> Result<(), E> + 'static,
    {
        self.start_workers()?;
        let pool = self.pool.as_ref().ok_or(TaskError::ShutDown)?;

        let id = self.next_job_id;
        self.next_job_id += 1;

        let sender = self.sender.clone();
        pool.execute(move || {
            let payload = panic::catch_unwind(AssertUnwindSafe(job))
                .map(|value| Box::new(value) as Box<dyn Any + Send>)
                .map_err(|p| TaskError::JobPanicked(panic_message(p.as_ref())));
            let _ = sender.send(Message::Completion { id, payload });
        })?;

        self.pending.insert(
            id,
            Box::new(move |host: &mut H, payload: Payload| {
                let result = payload.and_then(|boxed| {
                    boxed
                        .downcast::<T>()
                        .map(|value| *value)
                        .map_err(|_| TaskError::ResultType)
                });
                continuation(host, result)
            }),
        );
        Ok(())
    }

    /// Number of submitted jobs whose continuation has not yet been handed out.
    pub fn pending_jobs(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if any task, timer or background job is outstanding.
    pub fn has_pending_work(&self) -> bool {
        !self.tasks.is_empty()
            || !self.microtasks.is_empty()
            || !self.timers.is_empty()
            || !self.pending.is_empty()
    }

    /// Returns the next runnable task, blocking while only timers or
    /// background jobs are outstanding.
    pub fn next_task(&mut self) -> Turn<H, E> {
        loop {
            if self.is_interrupted() {
                return Turn::Interrupted;
            }
            if let Some(task) = self.microtasks.dequeue() {
                return Turn::Task(task);
            }
            if let Some(task) = self.tasks.dequeue() {
                return Turn::Task(task);
            }
            let now = Instant::now();
            if let Some(task) = self.timers.pop_expired(now) {
                return Turn::Task(task);
            }
            while let Ok(message) = self.receiver.try_recv() {
                if let Some(task) = self.accept(message) {
                    return Turn::Task(task);
                }
            }
            if self.is_interrupted() {
                return Turn::Interrupted;
            }
            if self.pending.is_empty() && self.timers.is_empty() {
                return Turn::Idle;
            }

            let message = match self.timers.next_deadline() {
                Some(deadline) => {
                    match self
                        .receiver
                        .recv_timeout(deadline.saturating_duration_since(now))
                    {
                        Ok(message) => message,
                        Err(RecvTimeoutError::Timeout) => continue,
                        // We hold a sender ourselves, so the channel cannot disconnect.
                        Err(RecvTimeoutError::Disconnected) => return Turn::Idle,
                    }
                }
                None => match self.receiver.recv() {
                    Ok(message) => message,
                    Err(_) => return Turn::Idle,
                },
            };
            if let Some(task) = self.accept(message) {
                return Turn::Task(task);
            }
        }
    }

    fn accept(&mut self, message: Message) -> Option<Task<H, E>> {
        match message {
            Message::Wake => None,
            Message::Completion { id, payload } => {
                let continuation = self.pending.remove(&id)?;
                Some(Task::new(move |host: &mut H| continuation(host, payload)))
            }
        }
    }

    /// Runs tasks against `host` until the loop drains or is interrupted.
    ///
    /// Only usable when the loop is not itself owned by the host; a host that
    /// owns its loop drives [`EventLoop::next_task`] directly.
    pub fn run_until_idle(&mut self, host: &mut H) -> Result<RunOutcome, E> {
        loop {
            match self.next_task() {
                Turn::Task(task) => task.run(host)?,
                Turn::Idle => return Ok(RunOutcome::Idle),
                Turn::Interrupted => return Ok(RunOutcome::Interrupted),
            }
        }
    }

    /// Drops every queued task, timer and pending continuation.
    ///
    /// Background jobs already running still finish; their results are discarded.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.microtasks.clear();
        self.timers.clear();
        self.pending.clear();
    }

    /// Stops the worker threads after their current jobs.
    pub fn shutdown(&mut self) {
        self.clear();
        self.closed = true;
        self.pool.take();
    }
}

impl<H: 'static, E: 'static> Default for EventLoop<H, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: 'static, E: 'static> fmt::Debug for EventLoop<H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("tasks", &self.tasks.len())
            .field("microtasks", &self.microtasks.len())
            .field("timers", &self.timers.len())
            .field("pending_jobs", &self.pending.len())
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}
