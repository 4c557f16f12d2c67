//! Worker pools backing cluster fan-out.
//!
//! One pool serves every engine instance of a tree level, so freezing and
//! replacing children never multiplies threads.

use std::fmt;
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::effective_threads;
use crate::error::Result;

/// Shared rayon pool for one level of the shard tree.
#[derive(Clone)]
pub struct FanoutPool {
    name: Arc<str>,
    pool: Arc<ThreadPool>,
}

impl fmt::Debug for FanoutPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutPool")
            .field("name", &self.name)
            .field("threads", &self.threads())
            .finish()
    }
}

impl FanoutPool {
    /// Builds a pool with `threads` workers (0 = available parallelism).
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerPool`](crate::Error::WorkerPool) if rayon cannot
    /// start the threads.
    pub fn new(name: &str, threads: usize) -> Result<Self> {
        let threads = effective_threads(threads);
        let prefix = name.to_string();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{prefix}-fanout-{i}"))
            .build()?;
        tracing::debug!(pool = name, threads, "fan-out pool started");
        Ok(Self {
            name: Arc::from(name),
            pool: Arc::new(pool),
        })
    }

    /// Pool label used in thread names and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub(crate) fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    pub(crate) fn scope<'scope, F>(&self, op: F)
    where
        F: FnOnce(&rayon::Scope<'scope>) + Send,
    {
        self.pool.scope(op);
    }
}
