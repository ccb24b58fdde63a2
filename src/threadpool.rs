//! Fixed-size worker pool
//!
//! Workers pull boxed jobs from a shared queue. Every submission gets its own
//! one-shot result channel, so callers can wait on handles in whatever order
//! they like while completion order stays free.

use crate::error::{MtcError, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Pending result of a submitted unit of work
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Block until the work item finishes and take its result
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().map_err(|_| MtcError::WorkerLost)
    }
}

/// Thread pool for parallel chunk processing
pub struct WorkerPool {
    job_sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);
        let (job_sender, job_receiver) = unbounded::<Job>();

        let mut workers = Vec::with_capacity(num_threads);
        for worker_id in 0..num_threads {
            let job_receiver = job_receiver.clone();
            let worker = thread::Builder::new()
                .name(format!("mtc-worker-{}", worker_id))
                .spawn(move || Self::worker_loop(worker_id, job_receiver));

            match worker {
                Ok(handle) => workers.push(handle),
                Err(e) => log::error!("Failed to spawn worker {}: {}", worker_id, e),
            }
        }

        Self {
            job_sender: Some(job_sender),
            workers,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Queue a unit of work. Its captured state is moved onto the worker.
    pub fn submit<F, T>(&self, work: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (result_sender, result_receiver) = bounded::<T>(1);
        let job: Job = Box::new(move || {
            // The submitter may have stopped waiting; nothing to do then.
            let _ = result_sender.send(work());
        });

        match &self.job_sender {
            Some(sender) => {
                if sender.send(job).is_err() {
                    log::error!("Worker pool has no live workers left");
                }
            }
            None => log::error!("Work submitted to a pool that is shutting down"),
        }

        // A dropped job drops its result sender, which the handle reports as WorkerLost.
        TaskHandle { receiver: result_receiver }
    }

    /// Stop accepting work, drain the queue and join every worker
    pub fn shutdown(mut self) {
        self.join_workers();
    }

    fn join_workers(&mut self) {
        drop(self.job_sender.take()); // Close the job channel

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("Worker thread panicked during shutdown");
            }
        }
    }

    fn worker_loop(worker_id: usize, job_receiver: Receiver<Job>) {
        log::debug!("Worker {} started", worker_id);

        while let Ok(job) = job_receiver.recv() {
            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                log::error!("Worker {} recovered from a panicking job", worker_id);
            }
        }

        log::debug!("Worker {} finished", worker_id);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_workers();
    }
}
