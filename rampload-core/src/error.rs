use thiserror::Error;

/// Conditions that abort a load run before it can produce a result.
///
/// Anything that goes wrong *inside* a run (probe errors, timeouts, crashed workers) is recorded as
/// an [`InvocationOutcome`](crate::InvocationOutcome) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("a run needs at least one client")]
    InvalidClients,

    #[error("unknown load profile `{0}` (expected light, medium, heavy or stress)")]
    UnknownProfile(String),

    #[error("failed to start the worker pool: {0}")]
    WorkerPool(#[from] std::io::Error),

    #[error("run interrupted while starting workers")]
    Interrupted,
}
