//! # Managed-Async Worker Pool
//!
//! Runs managed-async units of work on a fixed set of `may` coroutines.
//!
//! ## Features
//!
//! - **Shared queue**: all workers pull from one unbounded `may` MPSC channel,
//!   so load spreads automatically
//! - **Panic isolation**: a panicking unit is logged and the worker keeps going;
//!   units are expected to catch their own panics and resolve their request
//! - **Metrics**: submitted/completed counters and approximate queue depth
//!
//! ## Configuration
//!
//! Worker count and coroutine stack size come from [`RuntimeConfig`]
//! (`BRRTI_MANAGED_WORKERS`, `BRRTI_STACK_SIZE`).

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use may::sync::mpsc;
use tracing::{debug, error, info};

use crate::context::panic_message;
use crate::invoker::DispatchError;
use crate::runtime_config::RuntimeConfig;

/// A unit of work queued on the pool.
pub type Job = Box<dyn FnOnce() + Send>;

/// Counters describing pool activity
#[derive(Debug, Default)]
pub struct ManagedPoolMetrics {
    submitted: AtomicU64,
    completed: AtomicU64,
    queue_depth: AtomicUsize,
}

impl ManagedPoolMetrics {
    fn record_submit(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    fn record_completion(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    fn record_rejected(&self) {
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
        self.submitted.fetch_sub(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn completed_count(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Units submitted but not yet finished (approximate)
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }
}

/// Coroutine pool executing managed-async invocations.
pub struct ManagedPool {
    sender: mpsc::Sender<Job>,
    metrics: Arc<ManagedPoolMetrics>,
    workers: usize,
}

impl ManagedPool {
    /// Spawn `config.managed_workers` worker coroutines.
    ///
    /// Workers that fail to spawn are logged and skipped; the pool keeps
    /// running with the ones that did.
    #[must_use]
    pub fn new(config: &RuntimeConfig) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(rx);
        let metrics = Arc::new(ManagedPoolMetrics::default());
        let mut workers = 0;

        info!(
            num_workers = config.managed_workers,
            stack_size = config.stack_size,
            "Creating managed-async pool"
        );

        for worker_id in 0..config.managed_workers {
            let rx = Arc::clone(&rx);
            let metrics = Arc::clone(&metrics);

            // SAFETY: may::coroutine::Builder::spawn() is unsafe because coroutines
            // must not hold thread-local references across yields. Jobs are
            // Send + 'static boxed closures and the loop holds no TLS borrows.
            let spawn_result = unsafe {
                may::coroutine::Builder::new()
                    .name(format!("managed-async-{worker_id}"))
                    .stack_size(config.stack_size)
                    .spawn(move || {
                        debug!(worker_id = worker_id, "Managed worker started");
                        while let Ok(job) = rx.recv() {
                            if let Err(panic) =
                                std::panic::catch_unwind(std::panic::AssertUnwindSafe(job))
                            {
                                error!(
                                    worker_id = worker_id,
                                    panic_message = %panic_message(panic.as_ref()),
                                    "Managed unit panicked outside its own guard"
                                );
                            }
                            metrics.record_completion();
                        }
                        debug!(worker_id = worker_id, "Managed worker exiting");
                    })
            };

            match spawn_result {
                Ok(_) => workers += 1,
                Err(e) => error!(
                    worker_id = worker_id,
                    error = %e,
                    "Failed to spawn managed worker coroutine"
                ),
            }
        }

        Self {
            sender: tx,
            metrics,
            workers,
        }
    }

    /// Queue a unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Unavailable`] if no worker is running to take it.
    pub fn submit(&self, job: Job) -> Result<(), DispatchError> {
        if self.workers == 0 {
            return Err(DispatchError::Unavailable {
                reason: "managed-async pool has no workers".to_string(),
            });
        }
        self.metrics.record_submit();
        self.sender.send(job).map_err(|e| {
            self.metrics.record_rejected();
            DispatchError::Unavailable {
                reason: format!("managed-async pool closed: {e}"),
            }
        })
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<ManagedPoolMetrics> {
        &self.metrics
    }

    /// Number of workers that were spawned successfully
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl std::fmt::Debug for ManagedPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedPool")
            .field("workers", &self.workers)
            .field("queue_depth", &self.metrics.queue_depth())
            .finish()
    }
}
