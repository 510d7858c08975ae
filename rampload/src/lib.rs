#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Lets `#[probe]` expansions (which name `::rampload`) resolve inside this crate too.
extern crate self as rampload;

pub mod probe;

mod driver;
mod telemetry;

pub use driver::{execute_load_test, LoadDriver};
pub use probe::{measure, ProbeOutput, ProbeStatus};
pub use rampload_core::{
    percentile, DriverConfig, Error, InvocationOutcome, LoadProfile, RunDescriptor, RunResult,
    RunStatistics, Verdict,
};
pub use rampload_macros::probe;

/// Constants shared by the driver and the acceptance thresholds.
pub mod constants {
    pub use rampload_core::{
        COMPLEX_OPERATION_BUDGET, DEFAULT_PROGRESS_INTERVAL, DEFAULT_THINK_TIME,
        DEFAULT_WORKER_TIMEOUT, FAIL_SUCCESS_RATE, MAX_ERROR_RATE, MAX_P95_LATENCY,
        MIN_THROUGHPUT_RPS, READ_OPERATION_BUDGET, REPORT_GENERATION_BUDGET, WRITE_OPERATION_BUDGET,
    };
}

pub mod prelude {
    pub use crate::driver::{execute_load_test, LoadDriver};
    pub use crate::probe::{ProbeOutput, ProbeStatus};
    pub use rampload_core::{InvocationOutcome, LoadProfile, RunDescriptor, RunResult, Verdict};
    pub use rampload_macros::probe;
    pub use tokio_util::sync::CancellationToken;
}
