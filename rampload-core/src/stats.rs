use crate::InvocationOutcome;
use std::fmt;
use std::time::Duration;

/// Summary statistics of a load run.
///
/// Computed once from the outcome list and the run duration; see [`RunResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStatistics {
    pub total: usize,
    pub successful: usize,
    /// `successful / total`, 0.0 for an empty run.
    pub success_rate: f64,
    /// Invocations per second over the run duration in whole milliseconds, 0.0 below 1 ms.
    pub throughput: f64,
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

impl RunStatistics {
    fn compute(sorted: &[Duration], successful: usize, duration: Duration) -> Self {
        let total = sorted.len();

        let success_rate = if total > 0 {
            successful as f64 / total as f64
        } else {
            0.
        };

        // Whole milliseconds; sub-millisecond runs report no throughput.
        let millis = duration.as_millis();
        let throughput = if millis == 0 {
            0.
        } else {
            total as f64 / (millis as f64 / 1_000.)
        };

        Self {
            total,
            successful,
            success_rate,
            throughput,
            mean: mean(sorted),
            min: sorted.first().copied().unwrap_or_default(),
            max: sorted.last().copied().unwrap_or_default(),
            p95: percentile(sorted, 0.95),
            p99: percentile(sorted, 0.99),
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.successful
    }

    pub fn error_rate(&self) -> f64 {
        if self.total > 0 {
            1. - self.success_rate
        } else {
            0.
        }
    }
}

/// Nearest-rank percentile over latencies sorted in ascending order.
///
/// The rank is `ceil(n * quantile) - 1`, clamped into the slice. An empty slice yields zero.
pub fn percentile(sorted: &[Duration], quantile: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }

    let rank = (sorted.len() as f64 * quantile).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

fn mean(latencies: &[Duration]) -> Duration {
    if latencies.is_empty() {
        return Duration::ZERO;
    }

    let total: u128 = latencies.iter().map(Duration::as_nanos).sum();
    let nanos = total / latencies.len() as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Aggregate of one load run.
///
/// Holds every collected outcome along with statistics derived from them at construction time.
/// There is deliberately no way to modify a `RunResult`; build a new one instead.
#[derive(Debug, Clone)]
pub struct RunResult {
    name: String,
    outcomes: Vec<InvocationOutcome>,
    duration: Duration,
    latencies: Vec<Duration>,
    stats: RunStatistics,
}

impl RunResult {
    pub fn new(name: impl Into<String>, outcomes: Vec<InvocationOutcome>, duration: Duration) -> Self {
        let mut latencies: Vec<Duration> = outcomes.iter().map(InvocationOutcome::elapsed).collect();
        latencies.sort_unstable();

        let successful = outcomes.iter().filter(|o| o.is_success()).count();
        let stats = RunStatistics::compute(&latencies, successful, duration);

        Self {
            name: name.into(),
            outcomes,
            duration,
            latencies,
            stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outcomes in the order they were collected. Only membership is meaningful.
    pub fn outcomes(&self) -> &[InvocationOutcome] {
        &self.outcomes
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn total(&self) -> usize {
        self.stats.total
    }

    pub fn successful(&self) -> usize {
        self.stats.successful
    }

    pub fn failed(&self) -> usize {
        self.stats.failed()
    }

    pub fn success_rate(&self) -> f64 {
        self.stats.success_rate
    }

    pub fn error_rate(&self) -> f64 {
        self.stats.error_rate()
    }

    pub fn throughput(&self) -> f64 {
        self.stats.throughput
    }

    pub fn mean(&self) -> Duration {
        self.stats.mean
    }

    pub fn min(&self) -> Duration {
        self.stats.min
    }

    pub fn max(&self) -> Duration {
        self.stats.max
    }

    pub fn p95(&self) -> Duration {
        self.stats.p95
    }

    pub fn p99(&self) -> Duration {
        self.stats.p99
    }

    /// Latency at an arbitrary quantile in `(0, 1]`, using the same rule as `p95`/`p99`.
    pub fn latency(&self, quantile: f64) -> Duration {
        percentile(&self.latencies, quantile)
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} ok ({:.1}%), {:.2} req/s, mean={:?}, p95={:?}, p99={:?}",
            self.name,
            self.stats.successful,
            self.stats.total,
            self.stats.success_rate * 100.,
            self.stats.throughput,
            self.stats.mean,
            self.stats.p95,
            self.stats.p99,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn ms(values: &[u64]) -> Vec<InvocationOutcome> {
        values
            .iter()
            .map(|v| InvocationOutcome::success(Duration::from_millis(*v), 200))
            .collect()
    }

    #[test]
    fn percentiles_use_nearest_rank() {
        let result = RunResult::new("p", ms(&[10, 20, 30, 40, 100]), Duration::from_secs(1));
        assert_eq!(result.p95(), Duration::from_millis(100));
        assert_eq!(result.p99(), Duration::from_millis(100));

        let result = RunResult::new("p", ms(&[10, 20, 30, 40]), Duration::from_secs(1));
        assert_eq!(result.p95(), Duration::from_millis(40));
        assert_eq!(result.latency(0.5), Duration::from_millis(20));
        assert_eq!(result.latency(0.25), Duration::from_millis(10));
    }

    #[test]
    fn percentile_ignores_input_order() {
        let mut values: Vec<u64> = (1..=200).collect();
        values.shuffle(&mut SmallRng::seed_from_u64(7));

        let result = RunResult::new("shuffled", ms(&values), Duration::from_secs(2));
        assert_eq!(result.p95(), Duration::from_millis(190));
        assert_eq!(result.p99(), Duration::from_millis(198));
        assert_eq!(result.min(), Duration::from_millis(1));
        assert_eq!(result.max(), Duration::from_millis(200));
    }

    #[test]
    fn empty_run_has_zeroed_statistics() {
        let result = RunResult::new("empty", vec![], Duration::ZERO);
        let stats = result.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.);
        assert_eq!(stats.throughput, 0.);
        assert_eq!(stats.mean, Duration::ZERO);
        assert_eq!(stats.min, Duration::ZERO);
        assert_eq!(stats.max, Duration::ZERO);
        assert_eq!(stats.p95, Duration::ZERO);
        assert_eq!(stats.p99, Duration::ZERO);
        assert_eq!(result.error_rate(), 0.);
    }

    #[test]
    fn success_rate_is_exact() {
        let mut outcomes = ms(&[5, 5, 5]);
        outcomes.push(InvocationOutcome::failure(Duration::from_millis(5), 500, "boom"));
        let result = RunResult::new("rate", outcomes, Duration::from_secs(1));

        assert_eq!(result.successful(), 3);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.success_rate(), 3. / 4.);
        assert_eq!(result.error_rate(), 1. / 4.);
    }

    #[test]
    fn all_failed_run_is_still_well_formed() {
        let outcomes = vec![InvocationOutcome::timed_out(Duration::from_secs(30)); 3];
        let result = RunResult::new("down", outcomes, Duration::from_secs(30));

        assert_eq!(result.success_rate(), 0.);
        assert_eq!(result.throughput(), 0.1);
        assert_eq!(result.p99(), Duration::from_secs(30));
    }

    #[test]
    fn throughput_and_mean() {
        let result = RunResult::new("tput", ms(&[10, 20, 30, 40]), Duration::from_millis(2_000));
        assert_eq!(result.throughput(), 2.);
        assert_eq!(result.mean(), Duration::from_millis(25));

        let result = RunResult::new("instant", ms(&[10]), Duration::ZERO);
        assert_eq!(result.throughput(), 0.);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let mut outcomes = ms(&[3, 1, 4, 1, 5, 9, 2, 6]);
        outcomes.push(InvocationOutcome::fault("reset"));
        let duration = Duration::from_millis(1_234);

        let first = RunResult::new("same", outcomes.clone(), duration);
        let second = RunResult::new("same", outcomes, duration);
        assert_eq!(first.stats(), second.stats());
        assert_eq!(
            first.stats().throughput.to_bits(),
            second.stats().throughput.to_bits()
        );
    }

    #[test]
    fn throughput_uses_whole_milliseconds() {
        let sub_ms = RunResult::new("fast", ms(&[1, 1, 1]), Duration::from_micros(400));
        assert_eq!(sub_ms.throughput(), 0.);

        let truncated = RunResult::new("fast", ms(&[1, 1, 1]), Duration::from_micros(1_500));
        assert!((truncated.throughput() - 3_000.).abs() < 1e-9);
    }
}
