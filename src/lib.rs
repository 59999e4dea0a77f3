//! Single-worker weighted job scheduler.
//!
//! Jobs are submitted in batches, each batch weighted relative to the
//! others; the queue runs them in order on one dedicated worker thread
//! while the controlling context observes aggregate progress and the
//! terminal outcome through an event channel.

pub mod config;
pub mod error;
pub mod event;
pub mod queue;
pub mod scheduler;
pub mod storage;

mod worker;
