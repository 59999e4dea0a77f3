//! Shared helpers for the integration tests: a configurable test job and
//! utilities for draining the queue's event channel.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use jobline::event::QueueEvent;
use jobline::scheduler::{Job, JobContext, JobResult};

/// Install the test log subscriber; safe to call from every test.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Records the names of jobs in the order they actually ran.
pub type RunLog = Arc<Mutex<Vec<String>>>;

pub fn run_log() -> RunLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_entries(log: &RunLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Test job with configurable weight, outcome, and progress reporting.
pub struct TestJob {
    name: String,
    weight: f64,
    emergency: bool,
    failure: Option<(String, String)>,
    panic_message: Option<String>,
    mid_progress: Vec<f64>,
    log: Option<RunLog>,
}

impl TestJob {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            weight: 1.0,
            emergency: false,
            failure: None,
            panic_message: None,
            mid_progress: Vec::new(),
            log: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn emergency(mut self) -> Self {
        self.emergency = true;
        self
    }

    pub fn failing(mut self, message: &str, details: &str) -> Self {
        self.failure = Some((message.to_string(), details.to_string()));
        self
    }

    pub fn panicking(mut self, message: &str) -> Self {
        self.panic_message = Some(message.to_string());
        self
    }

    /// Report these completion fractions mid-run, in order.
    pub fn reporting(mut self, fractions: &[f64]) -> Self {
        self.mid_progress = fractions.to_vec();
        self
    }

    pub fn recording(mut self, log: &RunLog) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }

    pub fn boxed(self) -> Box<dyn Job> {
        Box::new(self)
    }
}

impl Job for TestJob {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn is_emergency(&self) -> bool {
        self.emergency
    }

    fn run(&mut self, ctx: &JobContext<'_>) -> JobResult {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name.clone());
        }
        for fraction in &self.mid_progress {
            ctx.progress(*fraction);
        }
        if let Some(message) = &self.panic_message {
            panic!("{}", message);
        }
        match &self.failure {
            Some((message, details)) => JobResult::error(message.clone(), details.clone()),
            None => JobResult::ok(),
        }
    }
}

/// Receive the next event, failing the test after a 5 second timeout.
pub async fn next_event(events: &mut UnboundedReceiver<QueueEvent>) -> QueueEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a queue event")
        .expect("event channel closed")
}

/// Collect events up to and including the terminal `Finished`/`Failed`.
pub async fn drain_until_terminal(events: &mut UnboundedReceiver<QueueEvent>) -> Vec<QueueEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let terminal = matches!(event, QueueEvent::Finished | QueueEvent::Failed { .. });
        seen.push(event);
        if terminal {
            return seen;
        }
    }
}

/// The fractions of every `Progress` event, in order.
pub fn progress_fractions(events: &[QueueEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            QueueEvent::Progress { fraction, .. } => Some(*fraction),
            _ => None,
        })
        .collect()
}
