//! Worker-thread side of the scheduler.
//!
//! The scheduler spawns one worker thread at construction and reuses it
//! across runs. The thread blocks on a command channel; each `Run` command
//! executes the promoted active list to completion:
//!
//! 1. Jobs run strictly in order, one at a time.
//! 2. Per-job progress is translated into an overall queue fraction and
//!    sent to the controlling context.
//! 3. After a first failure, remaining non-emergency jobs are skipped and
//!    emergency jobs still run, in their original order.
//! 4. Exactly one terminal event (`Failed` or `Finished`) ends the run.

pub(crate) mod runner;

pub(crate) use runner::{JobRunner, WorkerCommand};
