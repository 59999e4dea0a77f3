//! Scheduling core: weighted job lists and the single-worker scheduler.
//!
//! Batches of jobs are normalized into the *pending* list as they are
//! submitted. Starting a run promotes pending to *active* (pending becomes
//! empty again) and dispatches the active list to the worker thread, which
//! executes it in order and reports progress and the terminal outcome over
//! the event channel.

pub mod job;
pub mod weights;

pub use job::{Job, JobContext, JobResult};
pub use weights::{WeightedJob, WeightedJobList};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;
use crate::event::{JobSummary, QueueEvent};
use crate::storage::GlobalStorage;
use crate::worker::{JobRunner, WorkerCommand};

/// Owns the pending and active job lists and the worker thread.
///
/// The worker thread is spawned once at construction and reused across
/// runs. `enqueue` and `start` must only be called from the controlling
/// context while no run is in progress.
pub struct Scheduler {
    pending: Mutex<WeightedJobList>,
    active: Arc<Mutex<WeightedJobList>>,
    commands: Option<UnboundedSender<WorkerCommand>>,
    events: UnboundedSender<QueueEvent>,
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    cancel: CancellationToken,
    worker: Option<thread::JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl Scheduler {
    /// Create the scheduler and spawn its worker thread. Returns the
    /// scheduler together with the receiving end of the event channel.
    pub fn new(
        config: &QueueConfig,
        storage: Arc<GlobalStorage>,
    ) -> (Self, UnboundedReceiver<QueueEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let active = Arc::new(Mutex::new(WeightedJobList::new()));
        let running = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        let runner = JobRunner::new(
            Arc::clone(&active),
            storage,
            event_tx.clone(),
            Arc::clone(&running),
            Arc::clone(&finished),
            cancel.clone(),
        );
        let worker = thread::Builder::new()
            .name(config.worker_thread_name.clone())
            .spawn(move || runner.run_loop(command_rx))
            .expect("failed to spawn scheduler worker thread");

        let scheduler = Self {
            pending: Mutex::new(WeightedJobList::new()),
            active,
            commands: Some(command_tx),
            events: event_tx,
            running,
            finished,
            cancel,
            worker: Some(worker),
            shutdown_timeout: config.shutdown_timeout,
        };
        (scheduler, event_rx)
    }

    /// Normalize a batch against `module_weight` and append it to the
    /// pending list, then notify observers of the new pending content.
    pub fn enqueue(&self, module_weight: f64, jobs: Vec<Box<dyn Job>>) {
        let batch_len = jobs.len();
        let mut pending = lock(&self.pending);
        pending.push_batch(module_weight, jobs);
        let summaries = pending.summaries();
        drop(pending);

        tracing::debug!(
            batch = batch_len,
            pending = summaries.len(),
            module_weight,
            "Batch enqueued"
        );
        let _ = self.events.send(QueueEvent::PendingChanged { jobs: summaries });
    }

    /// Promote the pending list to active and dispatch it to the worker.
    pub fn start(&self) {
        let overall_weight = self.promote();
        self.finished.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);

        let jobs = lock(&self.active).len();
        tracing::info!(jobs, overall_weight, "Starting job run");

        let dispatched = self
            .commands
            .as_ref()
            .map(|commands| commands.send(WorkerCommand::Run { overall_weight }).is_ok())
            .unwrap_or(false);
        if !dispatched {
            self.running.store(false, Ordering::SeqCst);
            tracing::error!("Worker thread is gone, run not dispatched");
        }
    }

    /// Swap pending and active, leaving pending empty, and compute the
    /// overall queue weight of the new active list.
    ///
    /// The active list must be empty: a non-empty active list means a
    /// prior run is still outstanding, which is a caller bug.
    fn promote(&self) -> f64 {
        let mut pending = lock(&self.pending);
        let mut active = lock(&self.active);
        assert!(
            active.is_empty(),
            "promotion requires an empty active list; a prior run is still outstanding"
        );
        std::mem::swap(&mut *pending, &mut *active);

        let span = active.span();
        if span < 1.0 {
            1.0
        } else {
            span
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether a run has reached its terminal state since the last start.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn pending_summaries(&self) -> Vec<JobSummary> {
        lock(&self.pending).summaries()
    }

    /// Stop the worker thread, waiting up to the configured shutdown
    /// timeout. A worker stuck in a job is detached and logged; the thread
    /// leaks rather than being terminated mid-job.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.commands.take();

        if let Some(handle) = self.worker.take() {
            let deadline = Instant::now() + self.shutdown_timeout;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                tracing::error!(
                    timeout_ms = self.shutdown_timeout.as_millis() as u64,
                    "Scheduler worker did not stop in time, detaching thread"
                );
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock(list: &Mutex<WeightedJobList>) -> MutexGuard<'_, WeightedJobList> {
    list.lock().unwrap_or_else(PoisonError::into_inner)
}
