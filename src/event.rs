use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events delivered to the controlling context.
///
/// Events are sent over an unbounded channel and can be serialized for
/// forwarding to a UI layer. Exactly one terminal event (`Failed` or
/// `Finished`) is delivered per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    /// Overall progress across the active list, in [0, 1], with the
    /// current job's human-readable status line.
    Progress { fraction: f64, message: String },

    /// The pending list changed; carries a summary of the whole list.
    PendingChanged { jobs: Vec<JobSummary> },

    /// The run ended with at least one job failure. Carries the first
    /// failing job's message and details.
    Failed { message: String, details: String },

    /// The run ended with every executed job succeeding.
    Finished,
}

/// Summary of one queued job, suitable for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub name: String,
    pub emergency: bool,
}
