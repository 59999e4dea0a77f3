use tokio::sync::mpsc::UnboundedSender;

use crate::event::QueueEvent;
use crate::storage::GlobalStorage;

/// An executable unit of work.
///
/// Jobs are submitted in batches, run exactly once each, in order, on the
/// scheduler's worker thread. A job's `weight` sets its share of the
/// batch's module weight for progress reporting; `is_emergency` marks jobs
/// that must still run after an earlier job has failed (cleanup/rollback).
pub trait Job: Send {
    /// Short human-readable name.
    fn name(&self) -> String;

    /// Status line shown while the job is running. Defaults to the name.
    fn status_message(&self) -> String {
        self.name()
    }

    /// Relative weight within the job's batch. Non-negative.
    fn weight(&self) -> f64 {
        1.0
    }

    /// Whether this job must still run after a preceding job has failed.
    fn is_emergency(&self) -> bool {
        false
    }

    /// Execute the job. Called exactly once, on the worker thread.
    ///
    /// Long-running jobs should report completion fractions through
    /// [`JobContext::progress`].
    fn run(&mut self, ctx: &JobContext<'_>) -> JobResult;
}

/// Outcome of a single job execution.
///
/// Failures are data, not errors: they are captured by the scheduler and
/// reported through the terminal [`QueueEvent::Failed`] event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    ok: bool,
    message: String,
    details: String,
}

impl JobResult {
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: String::new(),
            details: String::new(),
        }
    }

    pub fn error(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}

/// Handle passed to a running job.
///
/// Gives the job progress reporting scaled to its share of the overall
/// queue weight, and access to the shared storage.
pub struct JobContext<'a> {
    pub(crate) storage: &'a GlobalStorage,
    pub(crate) events: &'a UnboundedSender<QueueEvent>,
    pub(crate) cumulative: f64,
    pub(crate) weight: f64,
    pub(crate) overall_weight: f64,
    pub(crate) status: String,
}

impl JobContext<'_> {
    /// Report this job's own completion fraction, clamped to [0, 1].
    ///
    /// The emitted event carries the overall queue fraction: the weight of
    /// everything before this job plus the reported share of this job's
    /// weight, relative to the overall queue weight.
    pub fn progress(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        let overall = (self.cumulative + self.weight * fraction) / self.overall_weight;
        let _ = self.events.send(QueueEvent::Progress {
            fraction: overall,
            message: self.status.clone(),
        });
    }

    /// Shared storage for exchanging data with other jobs and the
    /// controlling context.
    pub fn storage(&self) -> &GlobalStorage {
        self.storage
    }
}
