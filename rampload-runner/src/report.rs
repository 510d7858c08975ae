//! Plain-text summary of a suite run.
use rampload::constants::{FAIL_SUCCESS_RATE, MAX_ERROR_RATE, MAX_P95_LATENCY, MIN_THROUGHPUT_RPS};
use rampload::{RunResult, Verdict};
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

const NAME_WIDTH: usize = 35;
const WIDE_RULE: usize = 100;
const NARROW_RULE: usize = 50;

/// Totals across every case of a suite run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overall {
    pub tests: usize,
    pub requests: usize,
    pub successful: usize,
    /// Percentage, `0..=100`.
    pub success_rate: f64,
    /// Requests per second over the whole suite, seeding included.
    pub throughput: f64,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct Report {
    results: Vec<RunResult>,
    duration: Duration,
}

impl Report {
    pub fn new(results: Vec<RunResult>, duration: Duration) -> Self {
        Self { results, duration }
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn overall(&self) -> Overall {
        let requests: usize = self.results.iter().map(RunResult::total).sum();
        let successful: usize = self.results.iter().map(RunResult::successful).sum();
        let success_rate = if requests > 0 {
            successful as f64 / requests as f64 * 100.
        } else {
            0.
        };
        let secs = self.duration.as_secs_f64();
        let throughput = if secs > 0. { requests as f64 / secs } else { 0. };

        Overall {
            tests: self.results.len(),
            requests,
            successful,
            success_rate,
            throughput,
            duration: self.duration,
        }
    }

    pub fn fastest(&self) -> Option<&RunResult> {
        self.results.iter().min_by_key(|r| r.mean())
    }

    pub fn slowest(&self) -> Option<&RunResult> {
        self.results.iter().max_by_key(|r| r.mean())
    }

    pub fn highest_throughput(&self) -> Option<&RunResult> {
        self.results
            .iter()
            .max_by(|a, b| a.throughput().total_cmp(&b.throughput()))
    }

    /// Mean of the per-case p95 latencies, in milliseconds.
    pub fn average_p95_ms(&self) -> f64 {
        if self.results.is_empty() {
            return 0.;
        }
        let sum: f64 = self.results.iter().map(|r| millis(r.p95())).sum();
        sum / self.results.len() as f64
    }

    pub fn warnings(&self) -> Vec<String> {
        let overall = self.overall();
        let mut warnings = Vec::new();

        if overall.success_rate < FAIL_SUCCESS_RATE * 100. {
            warnings.push(format!(
                "Low overall success rate: {:.1}% (expected: >{:.0}%)",
                overall.success_rate,
                FAIL_SUCCESS_RATE * 100.
            ));
        }

        if overall.throughput < MIN_THROUGHPUT_RPS {
            warnings.push(format!(
                "Low overall throughput: {:.1} req/s (expected: >{MIN_THROUGHPUT_RPS:.1} req/s)",
                overall.throughput
            ));
        }

        for result in &self.results {
            if result.success_rate() < 1. - MAX_ERROR_RATE {
                warnings.push(format!(
                    "{}: Low success rate {:.1}%",
                    result.name(),
                    result.success_rate() * 100.
                ));
            }

            if result.p95() > MAX_P95_LATENCY {
                warnings.push(format!(
                    "{}: High P95 response time {} ms (expected: <{} ms)",
                    result.name(),
                    result.p95().as_millis(),
                    MAX_P95_LATENCY.as_millis()
                ));
            }
        }

        warnings
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overall = self.overall();

        writeln!(f, "{}", "=".repeat(WIDE_RULE))?;
        writeln!(f, "📊 PERFORMANCE TEST RESULTS SUMMARY")?;
        writeln!(f, "{}", "=".repeat(WIDE_RULE))?;
        writeln!(f, "📈 Overall Statistics:")?;
        writeln!(f, "   • Total Tests: {}", overall.tests)?;
        writeln!(f, "   • Total Requests: {}", overall.requests)?;
        writeln!(f, "   • Successful Requests: {}", overall.successful)?;
        writeln!(f, "   • Overall Success Rate: {:.2}%", overall.success_rate)?;
        writeln!(f, "   • Overall Throughput: {:.2} requests/sec", overall.throughput)?;
        writeln!(
            f,
            "   • Total Duration: {:.2} seconds",
            overall.duration.as_secs_f64()
        )?;

        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(WIDE_RULE))?;
        writeln!(f, "📋 DETAILED RESULTS BY TEST")?;
        writeln!(f, "{}", "-".repeat(WIDE_RULE))?;
        writeln!(f, "{}", header())?;
        writeln!(f, "{}", "-".repeat(WIDE_RULE))?;
        for result in &self.results {
            writeln!(f, "{}", row(result))?;
        }
        writeln!(f, "{}", "-".repeat(WIDE_RULE))?;

        writeln!(f)?;
        writeln!(f, "🔍 PERFORMANCE ANALYSIS")?;
        writeln!(f, "{}", "-".repeat(NARROW_RULE))?;
        if let Some(fastest) = self.fastest() {
            writeln!(
                f,
                "🏃 Fastest Test: {} ({:.0} ms avg)",
                fastest.name(),
                millis(fastest.mean())
            )?;
        }
        if let Some(slowest) = self.slowest() {
            writeln!(
                f,
                "🐌 Slowest Test: {} ({:.0} ms avg)",
                slowest.name(),
                millis(slowest.mean())
            )?;
        }
        if let Some(top) = self.highest_throughput() {
            writeln!(
                f,
                "⚡ Highest Throughput: {} ({:.1} req/s)",
                top.name(),
                top.throughput()
            )?;
        }
        writeln!(f, "📊 Average P95 Response Time: {:.0} ms", self.average_p95_ms())?;

        writeln!(f)?;
        writeln!(f, "⚠️ WARNINGS")?;
        writeln!(f, "{}", "-".repeat(NARROW_RULE))?;
        let warnings = self.warnings();
        if warnings.is_empty() {
            writeln!(f, "✅ All performance metrics are within acceptable ranges!")?;
        }
        for warning in warnings {
            writeln!(f, "⚠️ {warning}")?;
        }

        Ok(())
    }
}

pub fn header() -> String {
    format!(
        "{:<35} | {:>8} | {:>8} | {:>7} | {:>8} | {:>6} | {:>6} | {:>6}",
        "Test Name", "Requests", "Success", "Rate%", "Tput/s", "Avg", "P95", "P99"
    )
}

/// One table line per case, ending with the case's verdict marker.
pub fn row(result: &RunResult) -> String {
    format!(
        "{:<35} | {:>8} | {:>8} | {:>6.1}% | {:>8.1} | {:>6.0} | {:>6} | {:>6} {}",
        truncate(result.name(), NAME_WIDTH),
        result.total(),
        result.successful(),
        result.success_rate() * 100.,
        result.throughput(),
        millis(result.mean()),
        result.p95().as_millis(),
        result.p99().as_millis(),
        Verdict::of(result).marker(),
    )
}

/// Shorten `name` to at most `max` characters, marking the cut with `...`.
pub fn truncate(name: &str, max: usize) -> Cow<'_, str> {
    if name.chars().count() <= max {
        return Cow::Borrowed(name);
    }
    let kept: String = name.chars().take(max.saturating_sub(3)).collect();
    Cow::Owned(format!("{kept}..."))
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.
}
