use crate::{RunResult, FAIL_SUCCESS_RATE, MAX_ERROR_RATE, MAX_P95_LATENCY};
use std::fmt;

/// Health classification of a finished run against the acceptance thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

impl Verdict {
    pub fn of(result: &RunResult) -> Self {
        let success_rate = result.success_rate();
        if success_rate < FAIL_SUCCESS_RATE {
            Verdict::Fail
        } else if success_rate < 1. - MAX_ERROR_RATE || result.p95() > MAX_P95_LATENCY {
            Verdict::Warn
        } else {
            Verdict::Pass
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Verdict::Pass => "🟢",
            Verdict::Warn => "🟡",
            Verdict::Fail => "🔴",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::Pass => "pass",
            Verdict::Warn => "warn",
            Verdict::Fail => "fail",
        };
        f.write_str(label)
    }
}
