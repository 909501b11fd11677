//! Background thread pool for image decoding.
//!
//! Uses work-stealing deques:
//! - New jobs go through a global injector
//! - Idle workers steal from each other
//!
//! Jobs may carry a [`CancelToken`]. A cancelled job is skipped when a
//! worker picks it up, so superseded decodes cost nothing once queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::deque::{Injector, Stealer, Worker};
use log::trace;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared cancellation flag for one queued job.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Worker pool with work-stealing.
///
/// # Example
/// ```ignore
/// let workers = Workers::new(2)?;
/// let token = CancelToken::new();
/// workers.execute_cancellable(token.clone(), move || decode());
/// token.cancel(); // skipped if not started yet
/// ```
pub struct Workers {
    injector: Arc<Injector<Job>>,
    handles: Vec<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl Workers {
    /// Spawn `num_threads` workers (at least one).
    pub fn new(num_threads: usize) -> std::io::Result<Self> {
        let num_threads = num_threads.max(1);
        let injector: Arc<Injector<Job>> = Arc::new(Injector::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let locals: Vec<Worker<Job>> = (0..num_threads).map(|_| Worker::new_fifo()).collect();
        let stealers: Vec<Stealer<Job>> = locals.iter().map(Worker::stealer).collect();

        let mut handles = Vec::with_capacity(num_threads);
        for (worker_id, local) in locals.into_iter().enumerate() {
            let injector = Arc::clone(&injector);
            let stop = Arc::clone(&shutdown);
            let stealers = stealers.clone();

            let spawned = thread::Builder::new()
                .name(format!("lightwall-decode-{}", worker_id))
                .spawn(move || {
                    trace!("Worker {} started", worker_id);
                    loop {
                        if let Some(job) = find_job(&local, &injector, &stealers) {
                            job();
                            continue;
                        }
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        // Idle: short sleep instead of spinning
                        thread::sleep(Duration::from_millis(1));
                    }
                    trace!("Worker {} stopped", worker_id);
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Let the threads already running exit
                    shutdown.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }

        trace!("Workers initialized: {} threads (work-stealing)", num_threads);

        Ok(Self {
            injector,
            handles,
            shutdown,
        })
    }

    pub fn num_threads(&self) -> usize {
        self.handles.len()
    }

    /// Run `f` unless `token` was cancelled before a worker got to it.
    pub fn execute_cancellable<F>(&self, token: CancelToken, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.injector.push(Box::new(move || {
            if token.is_cancelled() {
                trace!("Skipping cancelled job");
                return;
            }
            f();
        }));
    }
}

/// Own queue, then the injector, then other workers.
fn find_job(local: &Worker<Job>, injector: &Injector<Job>, stealers: &[Stealer<Job>]) -> Option<Job> {
    local
        .pop()
        .or_else(|| injector.steal_batch_and_pop(local).success())
        .or_else(|| stealers.iter().find_map(|s| s.steal().success()))
}

impl Drop for Workers {
    fn drop(&mut self) {
        let num_threads = self.handles.len();
        trace!("Workers shutting down ({} threads)...", num_threads);
        self.shutdown.store(true, Ordering::SeqCst);

        // A decode in flight may take a while; don't hold the UI hostage
        let deadline = Instant::now() + Duration::from_millis(500);
        for handle in std::mem::take(&mut self.handles) {
            while !handle.is_finished() {
                if Instant::now() >= deadline {
                    trace!("Shutdown timeout reached, exiting anyway");
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
            let _ = handle.join();
        }
        trace!("All {} workers stopped", num_threads);
    }
}
