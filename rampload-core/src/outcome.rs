use std::fmt;
use std::time::Duration;

/// Error text attached to the outcome substituted for a worker that missed its deadline.
pub const TIMEOUT_ERROR: &str = "Timeout";

/// Error text attached to the outcome substituted for a worker that was cancelled mid-run.
pub const INTERRUPTED_ERROR: &str = "Test interrupted";

/// Result of a single probe invocation.
///
/// Outcomes are produced once, either by the probe itself or by the driver when it has to stand
/// in for a probe (faults, timeouts, crashed workers), and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOutcome {
    elapsed: Duration,
    success: bool,
    status: u32,
    error: Option<String>,
}

impl InvocationOutcome {
    pub fn new(elapsed: Duration, success: bool, status: u32, error: Option<String>) -> Self {
        Self {
            elapsed,
            success,
            status,
            error,
        }
    }

    pub fn success(elapsed: Duration, status: u32) -> Self {
        Self::new(elapsed, true, status, None)
    }

    pub fn failure(elapsed: Duration, status: u32, error: impl Into<String>) -> Self {
        Self::new(elapsed, false, status, Some(error.into()))
    }

    /// Stand-in for a probe invocation that returned an error instead of an outcome.
    pub fn fault(description: impl Into<String>) -> Self {
        Self::failure(Duration::ZERO, 0, description)
    }

    /// Stand-in for a whole worker whose results did not arrive within `timeout`.
    pub fn timed_out(timeout: Duration) -> Self {
        Self::failure(timeout, 0, TIMEOUT_ERROR)
    }

    /// Stand-in for a whole worker that crashed or could not be joined.
    pub fn execution_error(description: impl fmt::Display) -> Self {
        Self::failure(Duration::ZERO, 0, format!("Execution error: {description}"))
    }

    /// Stand-in for a whole worker abandoned because the run was cancelled.
    pub fn interrupted() -> Self {
        Self::failure(Duration::ZERO, 0, INTERRUPTED_ERROR)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl fmt::Display for InvocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.success { "ok" } else { "failed" };
        write!(f, "{verdict} status={} elapsed={:?}", self.status, self.elapsed)?;
        if let Some(error) = &self.error {
            write!(f, " error={error}")?;
        }
        Ok(())
    }
}
