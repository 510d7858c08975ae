//! Load driver
//!
//! Runs a probe from many simulated clients at once. Every run gets its own multi-threaded worker
//! pool with one thread per client; the pool only lives for the duration of the run.
use crate::probe::ProbeOutput;
use crate::telemetry;
use rampload_core::{DriverConfig, Error, InvocationOutcome, RunDescriptor, RunResult};
use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::{Handle, Runtime};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Executes load runs.
///
/// # Example
/// ```no_run
/// use rampload::prelude::*;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), rampload::Error> {
///     let descriptor = LoadProfile::Light.descriptor();
///     let result = LoadDriver::new()
///         .think_time(Duration::from_millis(10))
///         .execute("Health Check", &descriptor, || health())
///         .await?;
///
///     println!("{result}");
///     Ok(())
/// }
///
/// #[probe]
/// async fn health() -> Result<u16, std::io::Error> {
///     Ok(200)
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct LoadDriver {
    config: DriverConfig,
    cancel: Option<CancellationToken>,
}

impl LoadDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DriverConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Pause between two consecutive invocations of the same worker.
    pub fn think_time(mut self, think_time: Duration) -> Self {
        self.config.think_time = think_time;
        self
    }

    /// How long to wait for each worker's results once collection reaches it.
    pub fn worker_timeout(mut self, worker_timeout: Duration) -> Self {
        self.config.worker_timeout = worker_timeout;
        self
    }

    /// Abort runs when `token` is cancelled.
    ///
    /// Cancelling while workers are still being started fails the run with
    /// [`Error::Interrupted`]. Cancelling afterwards records one interrupted outcome for every
    /// worker not collected yet, and the run still produces a result.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Run `probe` according to `descriptor` and aggregate every outcome into a [`RunResult`].
    ///
    /// Probe failures, probe errors, timeouts and crashed workers all end up as outcomes; the only
    /// errors returned are the ones that prevent the run from happening at all.
    ///
    /// Must be awaited from within a Tokio runtime with the time driver enabled.
    #[instrument(name = "load_run", skip_all, fields(name = name))]
    pub async fn execute<T, F, O>(
        &self,
        name: &str,
        descriptor: &RunDescriptor,
        probe: T,
    ) -> Result<RunResult, Error>
    where
        T: Fn() -> F + Send + Sync + Clone + 'static,
        F: Future<Output = O> + Send + 'static,
        O: ProbeOutput + Send + 'static,
    {
        descriptor.validate()?;
        info!("Starting {name} with {descriptor}");
        telemetry::describe();

        let mut pool = WorkerPool::new(name, descriptor.clients)?;
        let run: Arc<str> = Arc::from(name);
        let completed = Arc::new(AtomicUsize::new(0));
        let stagger = descriptor.stagger();

        let start = Instant::now();
        for id in 0..descriptor.clients {
            if self.is_cancelled() {
                warn!("Run interrupted after starting {id} workers");
                return Err(Error::Interrupted);
            }

            let worker = Worker {
                id,
                run: run.clone(),
                clients: descriptor.clients,
                invocations: descriptor.invocations_per_client,
                config: self.config.clone(),
                completed: completed.clone(),
            };
            pool.spawn(worker.run(probe.clone()).in_current_span());

            if !stagger.is_zero() && id + 1 < descriptor.clients {
                self.stagger(stagger).await?;
            }
        }
        debug!("All {} workers started", descriptor.clients);

        let mut outcomes = Vec::with_capacity(descriptor.expected_outcomes());
        for (id, handle) in pool.workers_mut().iter_mut().enumerate() {
            let collected = tokio::select! {
                biased;
                _ = cancelled(self.cancel.as_ref()) => Collected::Interrupted,
                res = tokio::time::timeout(self.config.worker_timeout, &mut *handle) => match res {
                    Ok(Ok(worker_outcomes)) => Collected::Finished(worker_outcomes),
                    Ok(Err(err)) => Collected::Crashed(err),
                    Err(_) => Collected::TimedOut,
                },
            };

            match collected {
                Collected::Finished(worker_outcomes) => outcomes.extend(worker_outcomes),
                Collected::TimedOut => {
                    warn!(
                        "Worker {id} timed out after {:?}",
                        self.config.worker_timeout
                    );
                    handle.abort();
                    let outcome = InvocationOutcome::timed_out(self.config.worker_timeout);
                    telemetry::record(&run, &outcome);
                    outcomes.push(outcome);
                }
                Collected::Crashed(err) => {
                    let description = describe_join_error(err);
                    error!("Worker {id} failed: {description}");
                    let outcome = InvocationOutcome::execution_error(description);
                    telemetry::record(&run, &outcome);
                    outcomes.push(outcome);
                }
                Collected::Interrupted => {
                    handle.abort();
                    let outcome = InvocationOutcome::interrupted();
                    telemetry::record(&run, &outcome);
                    outcomes.push(outcome);
                }
            }
        }
        let duration = start.elapsed();
        drop(pool);

        let result = RunResult::new(name, outcomes, duration);
        info!("Finished {result}");
        Ok(result)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    async fn stagger(&self, delay: Duration) -> Result<(), Error> {
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = cancelled(self.cancel.as_ref()) => {
                warn!("Run interrupted during ramp-up");
                Err(Error::Interrupted)
            }
        }
    }
}

/// Run `probe` with a default [`LoadDriver`].
pub async fn execute_load_test<T, F, O>(
    name: &str,
    descriptor: &RunDescriptor,
    probe: T,
) -> Result<RunResult, Error>
where
    T: Fn() -> F + Send + Sync + Clone + 'static,
    F: Future<Output = O> + Send + 'static,
    O: ProbeOutput + Send + 'static,
{
    LoadDriver::new().execute(name, descriptor, probe).await
}

enum Collected {
    Finished(Vec<InvocationOutcome>),
    TimedOut,
    Crashed(JoinError),
    Interrupted,
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        err.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Worker threads owned by a single run.
///
/// Dropping the pool shuts its runtime down without waiting, which cancels every task still on
/// it. This happens on every exit path of [`LoadDriver::execute`], including early returns and the
/// run future itself being dropped.
struct WorkerPool {
    runtime: Option<Runtime>,
    handle: Handle,
    workers: Vec<JoinHandle<Vec<InvocationOutcome>>>,
}

impl WorkerPool {
    fn new(name: &str, threads: usize) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads)
            .thread_name(format!("rampload-{name}"))
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        Ok(Self {
            runtime: Some(runtime),
            handle,
            workers: Vec::with_capacity(threads),
        })
    }

    fn spawn<F>(&mut self, worker: F)
    where
        F: Future<Output = Vec<InvocationOutcome>> + Send + 'static,
    {
        self.workers.push(self.handle.spawn(worker));
    }

    fn workers_mut(&mut self) -> &mut [JoinHandle<Vec<InvocationOutcome>>] {
        &mut self.workers
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            trace!("Shutting down worker pool");
            runtime.shutdown_background();
        }
    }
}

/// One simulated client.
struct Worker {
    id: usize,
    run: Arc<str>,
    clients: usize,
    invocations: usize,
    config: DriverConfig,
    completed: Arc<AtomicUsize>,
}

impl Worker {
    async fn run<T, F, O>(self, probe: T) -> Vec<InvocationOutcome>
    where
        T: Fn() -> F,
        F: Future<Output = O>,
        O: ProbeOutput + Send + 'static,
    {
        let mut outcomes = Vec::with_capacity(self.invocations);

        for invocation in 0..self.invocations {
            let outcome = match probe().await.into_outcome() {
                Ok(outcome) => outcome,
                Err(description) => {
                    debug!(
                        "Worker {} probe error on invocation {invocation}: {description}",
                        self.id
                    );
                    InvocationOutcome::fault(description)
                }
            };
            telemetry::record(&self.run, &outcome);
            outcomes.push(outcome);

            if invocation + 1 < self.invocations && !self.config.think_time.is_zero() {
                tokio::time::sleep(self.config.think_time).await;
            }
        }

        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if self.config.should_report_progress(completed, self.clients) {
            info!("{completed}/{} workers completed", self.clients);
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn ok_probe() -> impl Fn() -> std::future::Ready<InvocationOutcome> + Send + Sync + Clone {
        || std::future::ready(InvocationOutcome::success(Duration::from_millis(1), 200))
    }

    fn fast_driver() -> LoadDriver {
        LoadDriver::new().think_time(Duration::from_millis(1))
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn collects_every_invocation() {
        let descriptor = RunDescriptor::new("count", 4, 5, Duration::ZERO);
        let result = fast_driver()
            .execute("count", &descriptor, ok_probe())
            .await
            .unwrap();

        assert_eq!(result.name(), "count");
        assert_eq!(result.total(), 20);
        assert_eq!(result.successful(), 20);
        assert!(logs_contain("4/4 workers completed"));
    }

    #[tokio::test]
    async fn rejects_zero_clients() {
        let descriptor = RunDescriptor::new("empty", 0, 5, Duration::ZERO);
        let res = execute_load_test("empty", &descriptor, ok_probe()).await;
        assert!(matches!(res, Err(Error::InvalidClients)));
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn zero_invocations_yield_an_empty_result() {
        let descriptor = RunDescriptor::new("idle", 3, 0, Duration::ZERO);
        let result = fast_driver()
            .execute("idle", &descriptor, ok_probe())
            .await
            .unwrap();

        assert_eq!(result.total(), 0);
        assert_eq!(result.success_rate(), 0.);
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn probe_errors_become_failed_outcomes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = {
            let calls = calls.clone();
            move || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 2 {
                        Err("connection reset")
                    } else {
                        Ok(InvocationOutcome::success(Duration::from_millis(1), 200))
                    }
                }
            }
        };

        let descriptor = RunDescriptor::new("fault", 1, 5, Duration::ZERO);
        let result = fast_driver()
            .execute("fault", &descriptor, probe)
            .await
            .unwrap();

        assert_eq!(result.total(), 5);
        assert_eq!(result.failed(), 1);
        let fault = &result.outcomes()[2];
        assert!(!fault.is_success());
        assert_eq!(fault.status(), 0);
        assert_eq!(fault.elapsed(), Duration::ZERO);
        assert_eq!(fault.error(), Some("connection reset"));
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn probe_error_does_not_affect_other_workers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = {
            let calls = calls.clone();
            move || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 2 {
                        Err("connection reset")
                    } else {
                        Ok(InvocationOutcome::success(Duration::from_millis(1), 200))
                    }
                }
            }
        };

        let descriptor = RunDescriptor::new("isolated", 3, 5, Duration::ZERO);
        let result = fast_driver()
            .execute("isolated", &descriptor, probe)
            .await
            .unwrap();

        assert_eq!(result.total(), 15);
        assert_eq!(result.successful(), 14);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn panicking_worker_is_replaced_by_one_outcome() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = {
            let calls = calls.clone();
            move || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        panic!("probe exploded");
                    }
                    InvocationOutcome::success(Duration::from_millis(1), 200)
                }
            }
        };

        let descriptor = RunDescriptor::new("panic", 3, 4, Duration::ZERO);
        let result = fast_driver()
            .execute("panic", &descriptor, probe)
            .await
            .unwrap();

        assert_eq!(result.total(), 2 * 4 + 1);
        let crashed: Vec<_> = result
            .outcomes()
            .iter()
            .filter(|o| !o.is_success())
            .collect();
        assert_eq!(crashed.len(), 1);
        assert_eq!(crashed[0].error(), Some("Execution error: probe exploded"));
        assert!(logs_contain("probe exploded"));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn hung_worker_times_out() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = {
            let calls = calls.clone();
            move || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        std::future::pending::<()>().await;
                    }
                    InvocationOutcome::success(Duration::from_millis(1), 200)
                }
            }
        };

        let timeout = Duration::from_millis(200);
        let descriptor = RunDescriptor::new("hang", 3, 2, Duration::ZERO);
        let result = fast_driver()
            .worker_timeout(timeout)
            .execute("hang", &descriptor, probe)
            .await
            .unwrap();

        assert_eq!(result.total(), 2 * 2 + 1);
        let timed_out: Vec<_> = result
            .outcomes()
            .iter()
            .filter(|o| !o.is_success())
            .collect();
        assert_eq!(timed_out.len(), 1);
        assert_eq!(timed_out[0].error(), Some("Timeout"));
        assert_eq!(timed_out[0].elapsed(), timeout);
        assert_eq!(timed_out[0].status(), 0);
        assert!(logs_contain("timed out"));
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn ramp_up_spaces_worker_starts() {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let probe = {
            let starts = starts.clone();
            move || {
                starts.lock().unwrap().push(Instant::now());
                std::future::ready(InvocationOutcome::success(Duration::ZERO, 200))
            }
        };

        let descriptor = RunDescriptor::new("ramp", 4, 1, Duration::from_millis(400));
        let result = fast_driver()
            .execute("ramp", &descriptor, probe)
            .await
            .unwrap();
        assert_eq!(result.total(), 4);

        let mut starts = starts.lock().unwrap().clone();
        starts.sort();
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(50));
        }
        let spread = starts[3] - starts[0];
        assert!(spread >= Duration::from_millis(280), "spread was {spread:?}");
        assert!(result.duration() >= Duration::from_millis(300));
        assert!(result.duration() < Duration::from_secs(2));
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn think_time_separates_invocations() {
        let descriptor = RunDescriptor::new("think", 1, 3, Duration::ZERO);
        let result = LoadDriver::new()
            .think_time(Duration::from_millis(100))
            .execute("think", &descriptor, ok_probe())
            .await
            .unwrap();

        assert_eq!(result.total(), 3);
        assert!(result.duration() >= Duration::from_millis(200));
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn cancellation_during_ramp_up_aborts_the_run() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::ready(InvocationOutcome::success(Duration::ZERO, 200))
            }
        };
        let descriptor = RunDescriptor::new("abort", 5, 100_000, Duration::from_secs(30));

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                token.cancel();
            })
        };

        let res = fast_driver()
            .cancellation(token)
            .execute("abort", &descriptor, probe)
            .await;
        canceller.await.unwrap();

        assert!(matches!(res, Err(Error::Interrupted)));

        // The first worker was running; the pool must have stopped it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let settled = calls.load(Ordering::SeqCst);
        assert!(settled > 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn owned_probe_errors_cross_worker_threads() {
        let probe = || async { Err::<InvocationOutcome, String>(format!("refused by {}", "peer")) };

        let descriptor = RunDescriptor::new("owned", 2, 2, Duration::ZERO);
        let result = execute_load_test("owned", &descriptor, probe).await.unwrap();

        assert_eq!(result.total(), 4);
        assert!(result
            .outcomes()
            .iter()
            .all(|o| o.error() == Some("refused by peer")));
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn cancellation_during_collection_keeps_the_result() {
        let token = CancellationToken::new();
        let probe = || async {
            std::future::pending::<()>().await;
            InvocationOutcome::success(Duration::ZERO, 200)
        };

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                token.cancel();
            })
        };

        let descriptor = RunDescriptor::new("stop", 2, 3, Duration::ZERO);
        let result = fast_driver()
            .worker_timeout(Duration::from_secs(60))
            .cancellation(token)
            .execute("stop", &descriptor, probe)
            .await
            .unwrap();
        canceller.await.unwrap();

        assert_eq!(result.total(), 2);
        assert!(result
            .outcomes()
            .iter()
            .all(|o| o.error() == Some("Test interrupted")));
    }

    #[test]
    fn panic_payloads() {
        assert_eq!(panic_message(Box::new("static str")), "static str");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42u8)), "worker panicked");
    }
}
