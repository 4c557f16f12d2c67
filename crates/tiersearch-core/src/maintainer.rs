//! Background maintenance of leaf autocomplete structures.
//!
//! [`TrieMaintainer`] owns a fixed set of worker threads fed through a
//! channel. Leaves in deferred mode hand it a rebuild request and return
//! without waiting; a worker later drains whatever the leaf has queued by
//! then, so several requests for one leaf collapse into one effective
//! rebuild.
//!
//! # Lifecycle
//!
//! 1. [`TrieMaintainer::start`] spawns the workers.
//! 2. [`TrieMaintainer::drain`] waits for every accepted request.
//! 3. [`TrieMaintainer::shutdown`] stops accepting requests, lets the
//!    workers finish the ones already queued and joins them. Dropping the
//!    maintainer does the same.
//!
//! There is no ordering promise against readers: a search issued right
//! after a deferred write may not see that write's new words yet.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::config::effective_threads;
use crate::error::{Error, Result};
use crate::index::{LeafIndex, LeafInner, RebuildOutcome};

enum Job {
    Rebuild(Weak<LeafInner>),
}

#[derive(Default)]
struct MaintainerState {
    stopping: AtomicBool,
    outstanding: Mutex<usize>,
    idle: Condvar,
    scheduled: AtomicU64,
    completed: AtomicU64,
    discarded: AtomicU64,
}

impl MaintainerState {
    fn finish_one(&self) {
        let mut outstanding = self.outstanding.lock();
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.idle.notify_all();
        }
    }
}

/// Worker pool that rebuilds leaf autocomplete structures out of band.
pub struct TrieMaintainer {
    jobs: RwLock<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    state: Arc<MaintainerState>,
}

impl fmt::Debug for TrieMaintainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrieMaintainer")
            .field("workers", &self.worker_count)
            .field("running", &self.is_running())
            .field("scheduled", &self.scheduled())
            .field("completed", &self.completed())
            .finish_non_exhaustive()
    }
}

impl TrieMaintainer {
    /// Spawns `workers` maintenance threads (0 = available parallelism).
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerPool`] if a thread cannot be spawned.
    pub fn start(workers: usize) -> Result<Arc<Self>> {
        let worker_count = effective_threads(workers);
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let state = Arc::new(MaintainerState::default());

        let mut handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let rx = rx.clone();
            let state = Arc::clone(&state);
            let handle = std::thread::Builder::new()
                .name(format!("trie-maintainer-{id}"))
                .spawn(move || worker_loop(&rx, &state))
                .map_err(|e| Error::WorkerPool(format!("failed to spawn maintainer worker: {e}")))?;
            handles.push(handle);
        }

        tracing::info!(workers = worker_count, "trie maintainer started");
        Ok(Arc::new(Self {
            jobs: RwLock::new(Some(tx)),
            workers: Mutex::new(handles),
            worker_count,
            state,
        }))
    }

    /// Queues a rebuild of `leaf` and returns without waiting.
    ///
    /// Returns false once the maintainer is shut down; the caller should
    /// rebuild inline instead.
    pub fn schedule_rebuild(&self, leaf: &LeafIndex) -> bool {
        if self.state.stopping.load(Ordering::Acquire) {
            return false;
        }
        let jobs = self.jobs.read();
        let Some(tx) = jobs.as_ref() else {
            return false;
        };

        *self.state.outstanding.lock() += 1;
        if tx.send(Job::Rebuild(leaf.downgrade())).is_err() {
            self.state.finish_one();
            return false;
        }
        self.state.scheduled.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Blocks until every accepted request has run or been discarded.
    pub fn drain(&self) {
        let mut outstanding = self.state.outstanding.lock();
        while *outstanding > 0 {
            self.state.idle.wait(&mut outstanding);
        }
    }

    /// Stops accepting work, finishes queued requests and joins the workers.
    ///
    /// Every word written before this call is incorporated when it returns.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        self.state.stopping.store(true, Ordering::Release);
        let sender = self.jobs.write().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let handles: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("trie maintainer worker panicked during shutdown");
            }
        }
        tracing::info!(
            completed = self.completed(),
            discarded = self.discarded(),
            "trie maintainer stopped"
        );
    }

    /// True until [`shutdown`](Self::shutdown) is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.state.stopping.load(Ordering::Acquire)
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Requests accepted so far.
    #[must_use]
    pub fn scheduled(&self) -> u64 {
        self.state.scheduled.load(Ordering::Relaxed)
    }

    /// Requests that ran to completion (successfully or not).
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.state.completed.load(Ordering::Relaxed)
    }

    /// Requests skipped because their leaf was dropped first.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.state.discarded.load(Ordering::Relaxed)
    }
}

impl Drop for TrieMaintainer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(rx: &Receiver<Job>, state: &MaintainerState) {
    // Jobs accepted before shutdown still run: each one stands for words a
    // writer was already told were indexed.
    for job in rx.iter() {
        let ran = match job {
            Job::Rebuild(leaf) => run_rebuild(&leaf),
        };
        if ran {
            state.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            state.discarded.fetch_add(1, Ordering::Relaxed);
        }
        state.finish_one();
    }
}

/// Returns false when the leaf was dropped before the job ran.
fn run_rebuild(leaf: &Weak<LeafInner>) -> bool {
    let Some(leaf) = leaf.upgrade() else {
        return false;
    };
    match catch_unwind(AssertUnwindSafe(|| leaf.incorporate_pending_words())) {
        Ok(Ok(RebuildOutcome::Published { new_words })) => {
            tracing::trace!(new_words, "background rebuild published");
        }
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "background rebuild failed"),
        Err(_) => tracing::error!("background rebuild panicked"),
    }
    true
}
