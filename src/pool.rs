//! Bounded worker pool shared by the scanner and the size comparator.
//!
//! Wraps a [`rayon::ThreadPool`] with a fixed number of named OS threads
//! (`iddedup-worker-N`) so log lines can be attributed to the worker that
//! emitted them. Work submitted beyond the thread count queues until a
//! worker is free.

use std::fmt;
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 10;

/// Cheaply cloneable handle to a shared worker pool.
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<ThreadPool>,
    workers: usize,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .finish()
    }
}

impl WorkerPool {
    /// Build a pool with `workers` threads (at least one).
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system refuses to spawn the threads.
    pub fn new(workers: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("iddedup-worker-{i}"))
            .build()?;
        log::debug!("Worker pool started with {} threads", workers);
        Ok(Self {
            pool: Arc::new(pool),
            workers,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `op` in a scope on the pool; returns once `op` and every task
    /// spawned into the scope, transitively, has finished.
    ///
    /// A panic in any spawned task is re-raised here after the others drain.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(op)
    }

    /// Run `op` inside the pool so rayon parallel iterators use its threads.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}
