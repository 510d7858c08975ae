use std::time::Duration;

/// Pause a worker takes between two consecutive probe invocations.
pub const DEFAULT_THINK_TIME: Duration = Duration::from_millis(50);

/// How long the driver waits for a single worker's results before giving up on it.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Progress is logged every time this many workers have finished (and once all have).
pub const DEFAULT_PROGRESS_INTERVAL: usize = 5;

/// Highest acceptable share of failed invocations for a run.
pub const MAX_ERROR_RATE: f64 = 0.01;

/// Lowest acceptable throughput, in invocations per second.
pub const MIN_THROUGHPUT_RPS: f64 = 10.0;

/// Highest acceptable 95th percentile latency.
pub const MAX_P95_LATENCY: Duration = Duration::from_millis(1_000);

/// Success rate below which a run is considered failed outright.
pub const FAIL_SUCCESS_RATE: f64 = 0.95;

/// Response time budgets by kind of endpoint.
pub const READ_OPERATION_BUDGET: Duration = Duration::from_millis(200);
pub const WRITE_OPERATION_BUDGET: Duration = Duration::from_millis(500);
pub const COMPLEX_OPERATION_BUDGET: Duration = Duration::from_millis(1_000);
pub const REPORT_GENERATION_BUDGET: Duration = Duration::from_millis(3_000);
