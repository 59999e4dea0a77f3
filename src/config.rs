use std::time::Duration;

/// Configuration for the job queue and its worker thread.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How long facade teardown waits for the worker thread to stop before
    /// detaching it.
    pub shutdown_timeout: Duration,
    /// Name given to the worker thread, visible in debuggers and panics.
    pub worker_thread_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_millis(300),
            worker_thread_name: "jobline-worker".to_string(),
        }
    }
}

impl QueueConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = name.into();
        self
    }
}
