//! Async runtime for script execution.
//!
//! This crate provides the asynchronous machinery a script host needs:
//! - Event loop with task and microtask queues
//! - Timers ordered by deadline
//! - A worker pool for blocking I/O whose results come back to the loop thread
//!
//! # Overview
//!
//! - [`EventLoop`] - Main event loop coordinating task execution
//! - [`Task`] - A unit of work run against the host on the loop thread
//! - [`TimerQueue`] - Pending timers
//! - [`WorkerPool`] - Background threads for blocking work
//! - [`LoopHandle`] - Interrupts a loop from another thread
//!
//! The loop is generic over the host `H` it runs tasks against and the
//! error `E` tasks fail with, so it carries no dependency on the
//! interpreter that drives it.
//!
//! # Examples
//!
//! ```
//! use async_runtime::{EventLoop, Task};
//!
//! let mut event_loop: EventLoop<u32, String> = EventLoop::new();
//! event_loop
//!     .submit(|| 40 + 2, |total: &mut u32, result| {
//!         *total = result.map_err(|e| e.to_string())?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let mut total = 0;
//! event_loop.run_until_idle(&mut total).unwrap();
//! assert_eq!(total, 42);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event_loop;
pub mod task_queue;
pub mod timers;
pub mod worker;

// Re-export main types at crate root
pub use error::TaskError;
pub use event_loop::{EventLoop, EventLoopConfig, LoopHandle, RunOutcome, Turn};
pub use task_queue::{Task, TaskQueue};
pub use timers::{TimerId, TimerQueue};
pub use worker::WorkerPool;
