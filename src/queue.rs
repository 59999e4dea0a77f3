//! Process-wide job queue facade.
//!
//! The facade accepts batch submissions from the controlling context,
//! triggers runs, owns the shared [`GlobalStorage`], and hands out the
//! event channel the scheduler reports through. At most one facade may be
//! alive per process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::QueueConfig;
use crate::error::{QueueError, Result};
use crate::event::{JobSummary, QueueEvent};
use crate::scheduler::{Job, Scheduler};
use crate::storage::GlobalStorage;

static INSTANCE_ALIVE: AtomicBool = AtomicBool::new(false);

/// Access point for submitting and running jobs.
///
/// Constructed once per process; the constructor returns the facade
/// together with the receiving end of its event channel, which is where
/// progress, pending-changed and terminal events arrive.
pub struct JobQueue {
    scheduler: Scheduler,
    storage: Arc<GlobalStorage>,
}

impl JobQueue {
    /// Fallible constructor: errors with [`QueueError::InstanceExists`] if
    /// another facade is alive in this process.
    pub fn try_new(config: QueueConfig) -> Result<(Self, UnboundedReceiver<QueueEvent>)> {
        if INSTANCE_ALIVE.swap(true, Ordering::SeqCst) {
            return Err(QueueError::InstanceExists);
        }

        let storage = Arc::new(GlobalStorage::new());
        let (scheduler, events) = Scheduler::new(&config, Arc::clone(&storage));
        tracing::debug!("Job queue created");
        Ok((Self { scheduler, storage }, events))
    }

    /// Create the process-wide job queue.
    ///
    /// # Panics
    ///
    /// Panics if another facade is already alive; constructing a second
    /// queue is a programming error.
    pub fn new(config: QueueConfig) -> (Self, UnboundedReceiver<QueueEvent>) {
        Self::try_new(config).expect("a JobQueue instance already exists in this process")
    }

    /// Submit a batch of jobs weighted by `module_weight`.
    ///
    /// # Panics
    ///
    /// Panics if a run is in progress; submitting during a run is a
    /// programming error.
    pub fn enqueue(&self, module_weight: f64, jobs: Vec<Box<dyn Job>>) {
        assert!(
            !self.scheduler.is_running(),
            "enqueue called while the scheduler is running"
        );
        self.scheduler.enqueue(module_weight, jobs);
    }

    /// Promote pending jobs and start executing them on the worker thread.
    ///
    /// # Panics
    ///
    /// Panics if a run is already in progress.
    pub fn start(&self) {
        assert!(
            !self.scheduler.is_running(),
            "start called while the scheduler is running"
        );
        self.scheduler.start();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Whether the most recent run has reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    /// Summaries of the jobs currently waiting in the pending list.
    pub fn pending_jobs(&self) -> Vec<JobSummary> {
        self.scheduler.pending_summaries()
    }

    /// Shared storage for data exchanged between jobs and the controlling
    /// context. Owned by the facade and dropped with it.
    pub fn global_storage(&self) -> &Arc<GlobalStorage> {
        &self.storage
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.scheduler.shutdown();
        INSTANCE_ALIVE.store(false, Ordering::SeqCst);
        tracing::debug!("Job queue dropped");
    }
}
