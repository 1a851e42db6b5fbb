//! Fixed-size CPU worker pool for segmentation and encoding work
//!
//! The request-accepting tasks never run CPU-bound work inline; they submit
//! closures here and suspend on the result. The pool is created once at
//! startup, handed around explicitly, and torn down once at shutdown.

use crate::error::{RemovalError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Bounded pool of dedicated OS threads draining one FIFO queue
///
/// Each submission occupies exactly one worker for its full duration, and
/// submissions beyond capacity queue in submission order. Cancellation is
/// cooperative only: a caller that stops awaiting has its result discarded,
/// the in-flight worker is never interrupted.
pub struct WorkerPool {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkerPool {
    /// Spawn a pool of `size` worker threads
    #[must_use]
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "worker pool must have at least one thread");

        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..size)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                std::thread::Builder::new()
                    .name(format!("bgremove-worker-{index}"))
                    .spawn(move || {
                        loop {
                            // Release the queue lock before running the job so
                            // idle workers can pick up the next submission.
                            let job = { receiver.lock().blocking_recv() };
                            match job {
                                Some(job) => job(),
                                None => break,
                            }
                        }
                        tracing::debug!(worker = index, "worker thread exiting");
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        tracing::info!(workers = size, "worker pool started");

        Self {
            sender: Mutex::new(Some(sender)),
            handles: Mutex::new(handles),
            size,
        }
    }

    /// Number of worker threads
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Enqueue a unit of work and return a receiver for its result
    ///
    /// The job is queued before this returns, so call order is admission
    /// order. Dropping the receiver discards the eventual result without
    /// interrupting the worker.
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Processing` when the pool has been shut down.
    pub fn try_submit<F, T>(&self, job: F) -> Result<oneshot::Receiver<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let boxed: Job = Box::new(move || {
            // Send fails when the caller went away; the result is discarded.
            let _ = tx.send(job());
        });

        let sender = self.sender.lock();
        let sender = sender
            .as_ref()
            .ok_or_else(|| RemovalError::processing("worker pool is shut down"))?;
        sender
            .send(boxed)
            .map_err(|_| RemovalError::processing("worker pool queue closed"))?;
        Ok(rx)
    }

    /// Enqueue a unit of work and await its result
    ///
    /// This is the pool's single suspension point per request: the calling
    /// task parks on a oneshot channel without blocking the runtime.
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Processing` when the pool has been shut down or
    /// a worker exits before producing a result.
    pub async fn submit<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let rx = self.try_submit(job)?;
        rx.await
            .map_err(|_| RemovalError::processing("worker exited before returning a result"))
    }

    /// Close the queue and join all workers
    ///
    /// Already-queued work still runs to completion before the threads exit.
    /// Further submissions fail.
    pub fn shutdown(&self) {
        let sender = self.sender.lock().take();
        drop(sender);

        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("worker thread panicked during shutdown");
            }
        }
        tracing::info!("worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Close the queue; threads finish queued work and exit on their own.
        self.sender.lock().take();
    }
}
