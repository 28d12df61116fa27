//! Worker pool for off-thread tile production
//!
//! Every unit of work is submitted once to a rayon pool and answered through a
//! one-shot channel. The caller gets a [`WorkerFuture`] back immediately and
//! the pool thread resolves it exactly once, either with the task's value or
//! with a [`TileError`] when the task panicked.

use crate::error::{TileError, TileResult};
use futures::channel::oneshot;
use futures::FutureExt;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Worker pool sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker threads (0 lets rayon decide)
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_thread_name_prefix() -> String {
    "flatmask-worker".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            thread_name_prefix: default_thread_name_prefix(),
        }
    }
}

/// Cloneable handle to a shared rayon pool
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<ThreadPool>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl WorkerPool {
    pub fn new(config: &WorkerConfig) -> TileResult<Self> {
        let prefix = config.thread_name_prefix.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(move |idx| format!("{}-{}", prefix, idx))
            .build()
            .map_err(|e| TileError::Pool(e.to_string()))?;

        log::debug!(
            "Started worker pool with {} threads",
            pool.current_num_threads()
        );

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn current_num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `task` on a pool thread.
    ///
    /// The returned future resolves once with the task's value. A panic inside
    /// the task is caught on the worker and surfaces as
    /// [`TileError::WorkerFailed`]. Dropping the future does not cancel the
    /// task; its result is discarded.
    pub fn run_in_worker_thread<F, R>(&self, task: F) -> WorkerFuture<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();

        self.pool.spawn(move || {
            let result = catch_unwind(AssertUnwindSafe(task))
                .map_err(|payload| TileError::WorkerFailed(panic_message(payload.as_ref())));

            if let Err(e) = &result {
                log::warn!("{}", e);
            }

            // Receiver gone means the caller stopped waiting
            let _ = sender.send(result);
        });

        WorkerFuture { receiver }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker task panicked".to_string()
    }
}

/// Single-resolution handle to a value computed on the worker pool
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct WorkerFuture<R> {
    receiver: oneshot::Receiver<TileResult<R>>,
}

impl<R> Future for WorkerFuture<R> {
    type Output = TileResult<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.receiver.poll_unpin(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(TileError::WorkerDropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}
