use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::event::QueueEvent;
use crate::scheduler::job::{JobContext, JobResult};
use crate::scheduler::weights::WeightedJobList;
use crate::storage::GlobalStorage;

/// Progress message reported once every job in the active list is done.
const DONE_MESSAGE: &str = "Done";

/// Commands accepted by the worker thread.
#[derive(Debug)]
pub(crate) enum WorkerCommand {
    Run { overall_weight: f64 },
}

/// How a single run ended.
#[derive(Debug)]
enum RunOutcome {
    Completed,
    Failed { message: String, details: String },
    Cancelled,
}

/// Executes promoted job lists on the dedicated worker thread.
pub(crate) struct JobRunner {
    active: Arc<Mutex<WeightedJobList>>,
    storage: Arc<GlobalStorage>,
    events: UnboundedSender<QueueEvent>,
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl JobRunner {
    pub(crate) fn new(
        active: Arc<Mutex<WeightedJobList>>,
        storage: Arc<GlobalStorage>,
        events: UnboundedSender<QueueEvent>,
        running: Arc<AtomicBool>,
        finished: Arc<AtomicBool>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            active,
            storage,
            events,
            running,
            finished,
            cancel,
        }
    }

    /// Worker thread body: block on the command channel until it closes or
    /// the cancellation token fires.
    pub(crate) fn run_loop(self, mut commands: UnboundedReceiver<WorkerCommand>) {
        while let Some(command) = commands.blocking_recv() {
            match command {
                WorkerCommand::Run { overall_weight } => {
                    let outcome = self.run_once(overall_weight);
                    self.running.store(false, Ordering::SeqCst);
                    match outcome {
                        RunOutcome::Completed => {
                            self.finished.store(true, Ordering::SeqCst);
                            tracing::info!("Job run finished");
                            let _ = self.events.send(QueueEvent::Finished);
                        }
                        RunOutcome::Failed { message, details } => {
                            self.finished.store(true, Ordering::SeqCst);
                            tracing::warn!(message = %message, "Job run failed");
                            let _ = self.events.send(QueueEvent::Failed { message, details });
                        }
                        RunOutcome::Cancelled => {
                            tracing::info!("Job run abandoned during shutdown");
                            break;
                        }
                    }
                }
            }
            if self.cancel.is_cancelled() {
                break;
            }
        }
        tracing::debug!("Scheduler worker exiting");
    }

    /// Execute the whole active list, holding its lock for the duration of
    /// the run.
    fn run_once(&self, overall_weight: f64) -> RunOutcome {
        let mut active = lock(&self.active);
        let total = active.len();
        let mut failure: Option<(String, String)> = None;

        for index in 0..total {
            if self.cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }

            let Some(entry) = active.get_mut(index) else {
                break;
            };

            if failure.is_some() && !entry.job.is_emergency() {
                tracing::debug!(job = %entry.job.name(), "Skipping non-emergency job after failure");
                continue;
            }

            let name = entry.job.name();
            tracing::info!(
                job = %name,
                index = index + 1,
                total,
                emergency = entry.job.is_emergency(),
                "Starting job"
            );

            let ctx = JobContext {
                storage: self.storage.as_ref(),
                events: &self.events,
                cumulative: entry.cumulative,
                weight: entry.weight,
                overall_weight,
                status: entry.job.status_message(),
            };

            ctx.progress(0.0);
            let result = match catch_unwind(AssertUnwindSafe(|| entry.job.run(&ctx))) {
                Ok(result) => result,
                Err(payload) => {
                    let details = panic_message(payload.as_ref());
                    tracing::error!(job = %name, details = %details, "Job panicked");
                    JobResult::error(format!("Job \"{name}\" panicked"), details)
                }
            };

            if !result.is_ok() {
                tracing::warn!(job = %name, message = %result.message(), "Job failed");
                if failure.is_none() {
                    failure = Some((result.message().to_string(), result.details().to_string()));
                }
            }
            ctx.progress(1.0);
        }

        active.clear();

        match failure {
            Some((message, details)) => RunOutcome::Failed { message, details },
            None => {
                let _ = self.events.send(QueueEvent::Progress {
                    fraction: 1.0,
                    message: DONE_MESSAGE.to_string(),
                });
                RunOutcome::Completed
            }
        }
    }
}

fn lock(active: &Mutex<WeightedJobList>) -> MutexGuard<'_, WeightedJobList> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
