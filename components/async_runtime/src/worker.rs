//! Fixed-size pool of named background threads.
//!
//! Blocking work (file system calls) runs here so the loop thread never
//! blocks on I/O. Jobs arrive over a crossbeam channel; a panicking job is
//! contained and the worker keeps serving.

use crate::error::TaskError;
use crossbeam::channel::{self, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A pool of worker threads.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `size` threads named `<name>-<n>`.
    ///
    /// Fails with [`TaskError::Provisioning`] if a thread cannot be spawned.
    pub fn new(name: &str, size: usize) -> Result<Self, TaskError> {
        let size = size.max(1);
        let (sender, receiver) = channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(size);

        for index in 0..size {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                            log::warn!("worker job panicked: {}", panic_message(payload.as_ref()));
                        }
                    }
                })
                .map_err(|e| TaskError::Provisioning(e.to_string()))?;
            workers.push(handle);
        }

        log::debug!("started {} worker thread(s) for {}", size, name);
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Queues a job for execution on some worker.
    pub fn execute<F>(&self, job: F) -> Result<(), TaskError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .as_ref()
            .ok_or(TaskError::ShutDown)?
            .send(Box::new(job))
            .map_err(|_| TaskError::ShutDown)
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel lets each worker finish its current job and exit.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
