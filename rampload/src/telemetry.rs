use rampload_core::InvocationOutcome;

#[cfg(feature = "metrics")]
pub(crate) const LATENCY: &str = "rampload_invocation_latency_seconds";
#[cfg(feature = "metrics")]
pub(crate) const SUCCESS: &str = "rampload_invocations_success_total";
#[cfg(feature = "metrics")]
pub(crate) const ERROR: &str = "rampload_invocations_error_total";

pub(crate) fn describe() {
    #[cfg(feature = "metrics")]
    {
        metrics::describe_histogram!(LATENCY, metrics::Unit::Seconds, "Probe invocation latency");
        metrics::describe_counter!(SUCCESS, "Successful probe invocations");
        metrics::describe_counter!(ERROR, "Failed probe invocations");
    }
}

#[allow(unused_variables)]
pub(crate) fn record(run: &str, outcome: &InvocationOutcome) {
    #[cfg(feature = "metrics")]
    {
        metrics::histogram!(LATENCY, "run" => run.to_string())
            .record(outcome.elapsed().as_secs_f64());

        if outcome.is_success() {
            metrics::counter!(SUCCESS, "run" => run.to_string()).increment(1);
        } else {
            metrics::counter!(ERROR, "run" => run.to_string()).increment(1);
        }
    }
}
