use crate::{DEFAULT_PROGRESS_INTERVAL, DEFAULT_THINK_TIME, DEFAULT_WORKER_TIMEOUT};
use std::time::Duration;

/// Tunables of the load driver that are not part of a run's shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    pub think_time: Duration,
    pub worker_timeout: Duration,
    pub progress_interval: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            think_time: DEFAULT_THINK_TIME,
            worker_timeout: DEFAULT_WORKER_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl DriverConfig {
    /// Whether finishing the `completed`-th of `clients` workers should be reported.
    pub fn should_report_progress(&self, completed: usize, clients: usize) -> bool {
        completed == clients || (self.progress_interval > 0 && completed % self.progress_interval == 0)
    }
}
